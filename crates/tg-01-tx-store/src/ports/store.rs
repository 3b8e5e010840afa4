//! # Transaction Store Port
//!
//! Everything the ingestion coordinator and the double-spend detector need
//! from persistence. Inserts are idempotent: a duplicate is reported through
//! the return value (`None`, `0` rows, empty list), never as an error.

use crate::domain::{
    BlockDoubleSpend, BlockRecord, BlockScanOutcome, DoubleSpendKey, DoubleSpendKind,
    DoubleSpendRecord, LinkedTransaction, MerkleProofRecord, NewBlock, NewTrackedTransaction,
    StoreError, TrackedTransaction,
};
use async_trait::async_trait;
use shared_types::{BlockId, Hash, InputTriple, OutPoint, TxId};

/// Transaction and block persistence.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    // =========================================================================
    // Blocks
    // =========================================================================

    /// Insert a block row.
    ///
    /// # Returns
    /// * `Some(id)` - The row was created
    /// * `None` - A block with this hash already exists
    async fn insert_block(&self, block: NewBlock) -> Result<Option<BlockId>, StoreError>;

    async fn get_block(&self, hash: &Hash) -> Result<Option<BlockRecord>, StoreError>;

    async fn get_block_by_id(&self, id: BlockId) -> Result<Option<BlockRecord>, StoreError>;

    /// Blocks inserted at or before `inserted_before` with either parse
    /// marker unset, oldest height first.
    async fn get_unparsed_blocks(
        &self,
        inserted_before: u64,
    ) -> Result<Vec<BlockRecord>, StoreError>;

    async fn set_block_parsed_for_merkle(&self, id: BlockId) -> Result<(), StoreError>;

    async fn set_block_parsed_for_double_spend(&self, id: BlockId) -> Result<(), StoreError>;

    // =========================================================================
    // Block links
    // =========================================================================

    /// Link the block to every tracked transaction in `txids` that is not yet
    /// linked to this block or to any block on its ancestry.
    ///
    /// # Returns
    /// The newly created links.
    async fn link_transactions_to_block(
        &self,
        block_id: BlockId,
        txids: &[Hash],
    ) -> Result<Vec<LinkedTransaction>, StoreError>;

    /// Links whose merkle-proof notification has not been acknowledged.
    async fn get_pending_merkle_proofs(&self) -> Result<Vec<MerkleProofRecord>, StoreError>;

    /// Set a link's merkle-proof-sent marker.
    ///
    /// # Returns
    /// `false` when the link does not exist or was already marked.
    async fn mark_merkle_proof_sent(
        &self,
        tx_id: TxId,
        block_id: BlockId,
        at: u64,
    ) -> Result<bool, StoreError>;

    // =========================================================================
    // Tracked transactions
    // =========================================================================

    /// Register a transaction the gateway accepted.
    ///
    /// Registering an id already known as an unconfirmed ancestor promotes
    /// that row in place.
    async fn insert_tracked_transaction(
        &self,
        tx: NewTrackedTransaction,
    ) -> Result<TxId, StoreError>;

    /// Record a transaction known only because a watched one spends it.
    /// Returns the existing id when the transaction is already tracked.
    async fn insert_unconfirmed_ancestor(
        &self,
        txid: Hash,
        inputs: Vec<OutPoint>,
    ) -> Result<TxId, StoreError>;

    async fn get_tracked_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<TrackedTransaction>, StoreError>;

    async fn get_tracked_transaction_by_id(
        &self,
        id: TxId,
    ) -> Result<Option<TrackedTransaction>, StoreError>;

    /// Double-spend-check enabled transactions among `roots` and everything
    /// transitively spending their outputs, minus those already holding a
    /// pool-level record against `conflicting_txid`. Roots come first, then
    /// descendants in breadth-first order.
    async fn get_double_spend_check_descendants(
        &self,
        roots: &[Hash],
        conflicting_txid: &Hash,
    ) -> Result<Vec<TrackedTransaction>, StoreError>;

    // =========================================================================
    // Double-spend records
    // =========================================================================

    /// Apply the fork-root heuristic for `block_id` and, when it fires,
    /// compare `triples` with the stored inputs of tracked transactions.
    /// Inserts one block-level record per conflict on a double-spend-check
    /// enabled transaction.
    async fn scan_and_insert_block_double_spends(
        &self,
        triples: &[InputTriple],
        delta_height: u64,
        block_id: BlockId,
    ) -> Result<BlockScanOutcome, StoreError>;

    /// Insert a derived block-level record for every double-spend-check
    /// enabled descendant of `ancestor_txid`.
    ///
    /// # Returns
    /// The records this call inserted.
    async fn insert_block_double_spends_for_descendants(
        &self,
        ancestor_txid: &Hash,
        block_id: BlockId,
        conflicting_txid: &Hash,
    ) -> Result<Vec<BlockDoubleSpend>, StoreError>;

    /// Insert one block-level record keyed by block hash.
    ///
    /// # Returns
    /// Rows affected: `0` when the record exists or the block is unknown.
    async fn insert_block_double_spend(
        &self,
        tx_id: TxId,
        block_hash: &Hash,
        conflicting_txid: &Hash,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError>;

    /// Insert one pool-level attempt.
    ///
    /// # Returns
    /// Rows affected: `0` when the record exists.
    async fn insert_pool_double_spend_attempt(
        &self,
        tx_id: TxId,
        conflicting_txid: &Hash,
        payload: Option<Vec<u8>>,
    ) -> Result<u64, StoreError>;

    async fn get_double_spends_without_payload(
        &self,
        kind: DoubleSpendKind,
    ) -> Result<Vec<DoubleSpendKey>, StoreError>;

    /// Attach a payload to a record that has none.
    ///
    /// # Returns
    /// Rows affected: `0` when the record is missing or already has one.
    async fn update_double_spend_payload(
        &self,
        key: &DoubleSpendKey,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError>;

    async fn get_double_spend(
        &self,
        key: &DoubleSpendKey,
    ) -> Result<Option<DoubleSpendRecord>, StoreError>;

    /// Records of both kinds whose notification has not been acknowledged.
    async fn get_pending_double_spends(&self) -> Result<Vec<DoubleSpendRecord>, StoreError>;

    /// Set a record's notification-sent marker.
    ///
    /// # Returns
    /// `false` when the record does not exist or was already marked.
    async fn mark_double_spend_sent(
        &self,
        key: &DoubleSpendKey,
        at: u64,
    ) -> Result<bool, StoreError>;
}
