//! # Notification Reader
//!
//! Read side for the callback dispatcher: pending notifications and their
//! acknowledgement markers.

use crate::domain::notification_from_record;
use shared_bus::{DoubleSpendNotification, MerkleProofNotification};
use shared_types::{BlockId, TxId};
use std::sync::Arc;
use tg_01_tx_store::{DoubleSpendKey, StoreError, TransactionStore};

pub struct NotificationReader<S> {
    store: Arc<S>,
}

impl<S: TransactionStore> NotificationReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Unacknowledged double-spend records, block-level first.
    pub async fn pending_double_spend_notifications(
        &self,
    ) -> Result<Vec<(DoubleSpendKey, DoubleSpendNotification)>, StoreError> {
        let records = self.store.get_pending_double_spends().await?;
        Ok(records
            .into_iter()
            .map(|record| (record.key, notification_from_record(record)))
            .collect())
    }

    /// Unacknowledged merkle-proof links.
    pub async fn pending_merkle_proofs(&self) -> Result<Vec<MerkleProofNotification>, StoreError> {
        let records = self.store.get_pending_merkle_proofs().await?;
        Ok(records
            .into_iter()
            .map(|r| MerkleProofNotification {
                tx_id: r.tx_id,
                txid: r.txid,
                block_id: r.block_id,
                block_hash: r.block_hash,
                callback: r.callback,
            })
            .collect())
    }

    pub async fn mark_double_spend_sent(
        &self,
        key: &DoubleSpendKey,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.store.mark_double_spend_sent(key, at).await
    }

    pub async fn mark_merkle_proof_sent(
        &self,
        tx_id: TxId,
        block_id: BlockId,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.store.mark_merkle_proof_sent(tx_id, block_id, at).await
    }
}
