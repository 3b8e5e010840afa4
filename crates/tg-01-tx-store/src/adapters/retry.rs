//! # Retrying Store
//!
//! Decorator that retries transient `StoreError::Database` failures with
//! capped exponential backoff. Any other error is returned immediately.

use crate::config::RetryConfig;
use crate::domain::{
    BlockDoubleSpend, BlockRecord, BlockScanOutcome, DoubleSpendKey, DoubleSpendKind,
    DoubleSpendRecord, LinkedTransaction, MerkleProofRecord, NewBlock, NewTrackedTransaction,
    StoreError, TrackedTransaction,
};
use crate::ports::TransactionStore;
use async_trait::async_trait;
use shared_types::{BlockId, Hash, InputTriple, OutPoint, TxId};
use std::future::Future;
use tracing::warn;

/// Wraps a `TransactionStore` and retries its transient failures.
pub struct RetryingStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: TransactionStore> RetryingStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    async fn retry<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        op,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient store failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<S: TransactionStore> TransactionStore for RetryingStore<S> {
    async fn insert_block(&self, block: NewBlock) -> Result<Option<BlockId>, StoreError> {
        self.retry("insert_block", || self.inner.insert_block(block.clone()))
            .await
    }

    async fn get_block(&self, hash: &Hash) -> Result<Option<BlockRecord>, StoreError> {
        self.retry("get_block", || self.inner.get_block(hash)).await
    }

    async fn get_block_by_id(&self, id: BlockId) -> Result<Option<BlockRecord>, StoreError> {
        self.retry("get_block_by_id", || self.inner.get_block_by_id(id))
            .await
    }

    async fn get_unparsed_blocks(
        &self,
        inserted_before: u64,
    ) -> Result<Vec<BlockRecord>, StoreError> {
        self.retry("get_unparsed_blocks", || {
            self.inner.get_unparsed_blocks(inserted_before)
        })
        .await
    }

    async fn set_block_parsed_for_merkle(&self, id: BlockId) -> Result<(), StoreError> {
        self.retry("set_block_parsed_for_merkle", || {
            self.inner.set_block_parsed_for_merkle(id)
        })
        .await
    }

    async fn set_block_parsed_for_double_spend(&self, id: BlockId) -> Result<(), StoreError> {
        self.retry("set_block_parsed_for_double_spend", || {
            self.inner.set_block_parsed_for_double_spend(id)
        })
        .await
    }

    async fn link_transactions_to_block(
        &self,
        block_id: BlockId,
        txids: &[Hash],
    ) -> Result<Vec<LinkedTransaction>, StoreError> {
        self.retry("link_transactions_to_block", || {
            self.inner.link_transactions_to_block(block_id, txids)
        })
        .await
    }

    async fn get_pending_merkle_proofs(&self) -> Result<Vec<MerkleProofRecord>, StoreError> {
        self.retry("get_pending_merkle_proofs", || {
            self.inner.get_pending_merkle_proofs()
        })
        .await
    }

    async fn mark_merkle_proof_sent(
        &self,
        tx_id: TxId,
        block_id: BlockId,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.retry("mark_merkle_proof_sent", || {
            self.inner.mark_merkle_proof_sent(tx_id, block_id, at)
        })
        .await
    }

    async fn insert_tracked_transaction(
        &self,
        tx: NewTrackedTransaction,
    ) -> Result<TxId, StoreError> {
        self.retry("insert_tracked_transaction", || {
            self.inner.insert_tracked_transaction(tx.clone())
        })
        .await
    }

    async fn insert_unconfirmed_ancestor(
        &self,
        txid: Hash,
        inputs: Vec<OutPoint>,
    ) -> Result<TxId, StoreError> {
        self.retry("insert_unconfirmed_ancestor", || {
            self.inner.insert_unconfirmed_ancestor(txid, inputs.clone())
        })
        .await
    }

    async fn get_tracked_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.retry("get_tracked_transaction", || {
            self.inner.get_tracked_transaction(txid)
        })
        .await
    }

    async fn get_tracked_transaction_by_id(
        &self,
        id: TxId,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.retry("get_tracked_transaction_by_id", || {
            self.inner.get_tracked_transaction_by_id(id)
        })
        .await
    }

    async fn get_double_spend_check_descendants(
        &self,
        roots: &[Hash],
        conflicting_txid: &Hash,
    ) -> Result<Vec<TrackedTransaction>, StoreError> {
        self.retry("get_double_spend_check_descendants", || {
            self.inner
                .get_double_spend_check_descendants(roots, conflicting_txid)
        })
        .await
    }

    async fn scan_and_insert_block_double_spends(
        &self,
        triples: &[InputTriple],
        delta_height: u64,
        block_id: BlockId,
    ) -> Result<BlockScanOutcome, StoreError> {
        self.retry("scan_and_insert_block_double_spends", || {
            self.inner
                .scan_and_insert_block_double_spends(triples, delta_height, block_id)
        })
        .await
    }

    async fn insert_block_double_spends_for_descendants(
        &self,
        ancestor_txid: &Hash,
        block_id: BlockId,
        conflicting_txid: &Hash,
    ) -> Result<Vec<BlockDoubleSpend>, StoreError> {
        self.retry("insert_block_double_spends_for_descendants", || {
            self.inner.insert_block_double_spends_for_descendants(
                ancestor_txid,
                block_id,
                conflicting_txid,
            )
        })
        .await
    }

    async fn insert_block_double_spend(
        &self,
        tx_id: TxId,
        block_hash: &Hash,
        conflicting_txid: &Hash,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.retry("insert_block_double_spend", || {
            self.inner
                .insert_block_double_spend(tx_id, block_hash, conflicting_txid, payload.clone())
        })
        .await
    }

    async fn insert_pool_double_spend_attempt(
        &self,
        tx_id: TxId,
        conflicting_txid: &Hash,
        payload: Option<Vec<u8>>,
    ) -> Result<u64, StoreError> {
        self.retry("insert_pool_double_spend_attempt", || {
            self.inner
                .insert_pool_double_spend_attempt(tx_id, conflicting_txid, payload.clone())
        })
        .await
    }

    async fn get_double_spends_without_payload(
        &self,
        kind: DoubleSpendKind,
    ) -> Result<Vec<DoubleSpendKey>, StoreError> {
        self.retry("get_double_spends_without_payload", || {
            self.inner.get_double_spends_without_payload(kind)
        })
        .await
    }

    async fn update_double_spend_payload(
        &self,
        key: &DoubleSpendKey,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.retry("update_double_spend_payload", || {
            self.inner.update_double_spend_payload(key, payload.clone())
        })
        .await
    }

    async fn get_double_spend(
        &self,
        key: &DoubleSpendKey,
    ) -> Result<Option<DoubleSpendRecord>, StoreError> {
        self.retry("get_double_spend", || self.inner.get_double_spend(key))
            .await
    }

    async fn get_pending_double_spends(&self) -> Result<Vec<DoubleSpendRecord>, StoreError> {
        self.retry("get_pending_double_spends", || {
            self.inner.get_pending_double_spends()
        })
        .await
    }

    async fn mark_double_spend_sent(
        &self,
        key: &DoubleSpendKey,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.retry("mark_double_spend_sent", || {
            self.inner.mark_double_spend_sent(key, at)
        })
        .await
    }
}
