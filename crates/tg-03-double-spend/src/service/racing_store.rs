//! Store wrapper where another writer records chosen pool attempts first.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{BlockId, Hash, InputTriple, OutPoint, TxId};
use std::collections::HashSet;
use std::sync::Arc;
use tg_01_tx_store::{
    BlockDoubleSpend, BlockRecord, BlockScanOutcome, DoubleSpendKey, DoubleSpendKind,
    DoubleSpendRecord, InMemoryTransactionStore, LinkedTransaction, MerkleProofRecord, NewBlock,
    NewTrackedTransaction, StoreError, TrackedTransaction, TransactionStore,
};

/// Delegates to an in-memory store. For transactions in `contested`, a
/// pool attempt insert lands the row as the other writer and reports zero
/// rows, as the losing side of a unique-key race sees it.
pub struct RacingStore {
    inner: Arc<InMemoryTransactionStore>,
    contested: Mutex<HashSet<TxId>>,
    pool_attempts: Mutex<Vec<TxId>>,
}

impl RacingStore {
    pub fn new(inner: Arc<InMemoryTransactionStore>) -> Self {
        Self {
            inner,
            contested: Mutex::new(HashSet::new()),
            pool_attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn contest(&self, tx_id: TxId) {
        self.contested.lock().insert(tx_id);
    }

    /// Every transaction a pool attempt insert was issued for, in order.
    pub fn pool_attempts(&self) -> Vec<TxId> {
        self.pool_attempts.lock().clone()
    }
}

#[async_trait]
impl TransactionStore for RacingStore {
    async fn insert_block(&self, block: NewBlock) -> Result<Option<BlockId>, StoreError> {
        self.inner.insert_block(block).await
    }

    async fn get_block(&self, hash: &Hash) -> Result<Option<BlockRecord>, StoreError> {
        self.inner.get_block(hash).await
    }

    async fn get_block_by_id(&self, id: BlockId) -> Result<Option<BlockRecord>, StoreError> {
        self.inner.get_block_by_id(id).await
    }

    async fn get_unparsed_blocks(
        &self,
        inserted_before: u64,
    ) -> Result<Vec<BlockRecord>, StoreError> {
        self.inner.get_unparsed_blocks(inserted_before).await
    }

    async fn set_block_parsed_for_merkle(&self, id: BlockId) -> Result<(), StoreError> {
        self.inner.set_block_parsed_for_merkle(id).await
    }

    async fn set_block_parsed_for_double_spend(&self, id: BlockId) -> Result<(), StoreError> {
        self.inner.set_block_parsed_for_double_spend(id).await
    }

    async fn link_transactions_to_block(
        &self,
        block_id: BlockId,
        txids: &[Hash],
    ) -> Result<Vec<LinkedTransaction>, StoreError> {
        self.inner.link_transactions_to_block(block_id, txids).await
    }

    async fn get_pending_merkle_proofs(&self) -> Result<Vec<MerkleProofRecord>, StoreError> {
        self.inner.get_pending_merkle_proofs().await
    }

    async fn mark_merkle_proof_sent(
        &self,
        tx_id: TxId,
        block_id: BlockId,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.inner.mark_merkle_proof_sent(tx_id, block_id, at).await
    }

    async fn insert_tracked_transaction(
        &self,
        tx: NewTrackedTransaction,
    ) -> Result<TxId, StoreError> {
        self.inner.insert_tracked_transaction(tx).await
    }

    async fn insert_unconfirmed_ancestor(
        &self,
        txid: Hash,
        inputs: Vec<OutPoint>,
    ) -> Result<TxId, StoreError> {
        self.inner.insert_unconfirmed_ancestor(txid, inputs).await
    }

    async fn get_tracked_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.inner.get_tracked_transaction(txid).await
    }

    async fn get_tracked_transaction_by_id(
        &self,
        id: TxId,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.inner.get_tracked_transaction_by_id(id).await
    }

    async fn get_double_spend_check_descendants(
        &self,
        roots: &[Hash],
        conflicting_txid: &Hash,
    ) -> Result<Vec<TrackedTransaction>, StoreError> {
        self.inner
            .get_double_spend_check_descendants(roots, conflicting_txid)
            .await
    }

    async fn scan_and_insert_block_double_spends(
        &self,
        triples: &[InputTriple],
        delta_height: u64,
        block_id: BlockId,
    ) -> Result<BlockScanOutcome, StoreError> {
        self.inner
            .scan_and_insert_block_double_spends(triples, delta_height, block_id)
            .await
    }

    async fn insert_block_double_spends_for_descendants(
        &self,
        ancestor_txid: &Hash,
        block_id: BlockId,
        conflicting_txid: &Hash,
    ) -> Result<Vec<BlockDoubleSpend>, StoreError> {
        self.inner
            .insert_block_double_spends_for_descendants(ancestor_txid, block_id, conflicting_txid)
            .await
    }

    async fn insert_block_double_spend(
        &self,
        tx_id: TxId,
        block_hash: &Hash,
        conflicting_txid: &Hash,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.inner
            .insert_block_double_spend(tx_id, block_hash, conflicting_txid, payload)
            .await
    }

    async fn insert_pool_double_spend_attempt(
        &self,
        tx_id: TxId,
        conflicting_txid: &Hash,
        payload: Option<Vec<u8>>,
    ) -> Result<u64, StoreError> {
        self.pool_attempts.lock().push(tx_id);
        let rows = self
            .inner
            .insert_pool_double_spend_attempt(tx_id, conflicting_txid, payload)
            .await?;
        if self.contested.lock().contains(&tx_id) {
            return Ok(0);
        }
        Ok(rows)
    }

    async fn get_double_spends_without_payload(
        &self,
        kind: DoubleSpendKind,
    ) -> Result<Vec<DoubleSpendKey>, StoreError> {
        self.inner.get_double_spends_without_payload(kind).await
    }

    async fn update_double_spend_payload(
        &self,
        key: &DoubleSpendKey,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.inner.update_double_spend_payload(key, payload).await
    }

    async fn get_double_spend(
        &self,
        key: &DoubleSpendKey,
    ) -> Result<Option<DoubleSpendRecord>, StoreError> {
        self.inner.get_double_spend(key).await
    }

    async fn get_pending_double_spends(&self) -> Result<Vec<DoubleSpendRecord>, StoreError> {
        self.inner.get_pending_double_spends().await
    }

    async fn mark_double_spend_sent(
        &self,
        key: &DoubleSpendKey,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.inner.mark_double_spend_sent(key, at).await
    }
}
