//! # Double-Spend Detector
//!
//! Three paths produce double-spend records:
//!
//! - **Block scan**: a parsed block's inputs against tracked inputs, gated by
//!   the fork-root heuristic. Conflicts propagate to watched descendants.
//! - **Pool conflict**: a rejected submission names colliding pool
//!   transactions; watched ones and their descendants get a pool attempt.
//! - **Pool eviction**: a block transaction evicted a watched pool
//!   transaction; the block is ingested first, then recorded against.
//!
//! Every record is announced at most once: notifications go out only for
//! rows the current call inserted.

use crate::config::DoubleSpendConfig;
use crate::domain::{
    notification_from_record, DoubleSpendError, EvictionOutcome, PoolConflictOutcome,
};
use crate::ports::DoubleSpendApi;
use async_trait::async_trait;
use shared_bus::{
    DoubleSpendNotification, EventPublisher, GatewayEvent, PoolConflictSignal, PoolEvictionSignal,
};
use shared_types::{short_hex, BlockContent};
use std::sync::Arc;
use tg_01_tx_store::{BlockRecord, DoubleSpendKey, DoubleSpendKind, StoreError, TransactionStore};
use tg_02_block_ingestion::{BlockConflictScanner, BlockIngestionApi};
use tracing::{debug, info, warn};

pub struct DoubleSpendDetector<S> {
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    ingestion: Arc<dyn BlockIngestionApi>,
    config: DoubleSpendConfig,
}

impl<S: TransactionStore> DoubleSpendDetector<S> {
    pub fn new(
        store: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
        ingestion: Arc<dyn BlockIngestionApi>,
        config: DoubleSpendConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            ingestion,
            config,
        }
    }

    pub fn config(&self) -> &DoubleSpendConfig {
        &self.config
    }

    /// Attach the conflicting transaction's raw bytes to this block's
    /// records that have none yet.
    async fn fill_block_payloads(
        &self,
        block: &BlockRecord,
        content: &BlockContent,
    ) -> Result<u64, StoreError> {
        let missing = self
            .store
            .get_double_spends_without_payload(DoubleSpendKind::Block)
            .await?;

        let mut filled = 0;
        for key in missing.iter().filter(|k| k.block_id() == Some(block.id)) {
            let Some(conflicting) = content.transaction(&key.conflicting_txid()) else {
                continue;
            };
            filled += self
                .store
                .update_double_spend_payload(key, conflicting.raw.clone())
                .await?;
        }
        Ok(filled)
    }

    /// Publish the stored snapshot of each freshly inserted record.
    async fn announce(&self, keys: &[DoubleSpendKey]) -> Result<usize, StoreError> {
        let mut sent = 0;
        for key in keys {
            let Some(record) = self.store.get_double_spend(key).await? else {
                warn!(tx_id = %key.tx_id(), "[tg-03] Inserted record vanished before notification");
                continue;
            };
            self.publisher
                .publish(GatewayEvent::DoubleSpendDetected(notification_from_record(record)))
                .await;
            sent += 1;
        }
        Ok(sent)
    }
}

#[async_trait]
impl<S: TransactionStore> BlockConflictScanner for DoubleSpendDetector<S> {
    async fn scan_block(
        &self,
        block: &BlockRecord,
        content: &BlockContent,
    ) -> Result<usize, StoreError> {
        let outcome = self
            .store
            .scan_and_insert_block_double_spends(
                &content.input_triples(),
                self.config.delta_block_height_for_double_spend_check,
                block.id,
            )
            .await?;
        if !outcome.scanned {
            return Ok(0);
        }

        let mut fresh: Vec<DoubleSpendKey> = outcome.inserted.iter().map(|r| r.key()).collect();
        for conflict in &outcome.conflicted {
            let derived = self
                .store
                .insert_block_double_spends_for_descendants(
                    &conflict.txid,
                    block.id,
                    &conflict.conflicting_txid,
                )
                .await?;
            fresh.extend(derived.iter().map(|r| r.key()));
        }

        let filled = self.fill_block_payloads(block, content).await?;
        if fresh.is_empty() {
            return Ok(0);
        }

        info!(
            block_hash = %short_hex(&block.hash),
            height = ?block.height,
            conflicts = outcome.conflicted.len(),
            records = fresh.len(),
            payloads = filled,
            "[tg-03] Double spends found in block"
        );
        self.announce(&fresh).await
    }
}

#[async_trait]
impl<S: TransactionStore> DoubleSpendApi for DoubleSpendDetector<S> {
    async fn handle_pool_conflict(
        &self,
        signal: &PoolConflictSignal,
    ) -> Result<PoolConflictOutcome, DoubleSpendError> {
        let mut outcome = PoolConflictOutcome::default();
        if !signal.reject_code.is_conflict() {
            debug!(
                rejected = %short_hex(&signal.rejected_txid),
                code = ?signal.reject_code,
                "[tg-03] Rejection is not a conflict, ignoring"
            );
            outcome.ignored = true;
            return Ok(outcome);
        }

        'colliding: for colliding in &signal.colliding_txids {
            let watched = self
                .store
                .get_double_spend_check_descendants(&[*colliding], &signal.rejected_txid)
                .await?;

            for tx in watched {
                let rows = self
                    .store
                    .insert_pool_double_spend_attempt(
                        tx.id,
                        &signal.rejected_txid,
                        signal.raw_payload.clone(),
                    )
                    .await?;
                if rows == 0 {
                    debug!(
                        txid = %short_hex(&tx.txid),
                        rejected = %short_hex(&signal.rejected_txid),
                        "[tg-03] Pool attempt already recorded, stopping"
                    );
                    outcome.stopped_early = true;
                    break 'colliding;
                }

                self.publisher
                    .publish(GatewayEvent::DoubleSpendDetected(DoubleSpendNotification {
                        tx_id: tx.id,
                        txid: tx.txid,
                        conflicting_txid: signal.rejected_txid,
                        block: None,
                        payload: signal.raw_payload.clone(),
                        callback: tx.callback,
                    }))
                    .await;
                outcome.notifications += 1;
            }
        }

        if outcome.notifications > 0 {
            info!(
                rejected = %short_hex(&signal.rejected_txid),
                notifications = outcome.notifications,
                "[tg-03] Pool double-spend attempts recorded"
            );
        }
        Ok(outcome)
    }

    async fn handle_pool_eviction(
        &self,
        signal: &PoolEvictionSignal,
    ) -> Result<EvictionOutcome, DoubleSpendError> {
        let ingested = self.ingestion.ingest_block(signal.block_hash).await?;
        let mut outcome = EvictionOutcome {
            blocks_ingested: ingested.depth(),
            notifications: 0,
        };

        let Some(tx) = self.store.get_tracked_transaction(&signal.evicted_txid).await? else {
            return Ok(outcome);
        };
        if !tx.double_spend_check {
            return Ok(outcome);
        }

        let rows = self
            .store
            .insert_block_double_spend(
                tx.id,
                &signal.block_hash,
                &signal.colliding_txid,
                signal.colliding_payload.clone(),
            )
            .await?;
        if rows == 0 {
            debug!(
                evicted = %short_hex(&signal.evicted_txid),
                block_hash = %short_hex(&signal.block_hash),
                "[tg-03] Eviction already recorded or block unknown"
            );
            return Ok(outcome);
        }

        let block_id = self.store.get_block(&signal.block_hash).await?.map(|b| b.id);
        self.publisher
            .publish(GatewayEvent::DoubleSpendDetected(DoubleSpendNotification {
                tx_id: tx.id,
                txid: tx.txid,
                conflicting_txid: signal.colliding_txid,
                block: block_id.map(|id| (id, signal.block_hash)),
                payload: Some(signal.colliding_payload.clone()),
                callback: tx.callback,
            }))
            .await;
        outcome.notifications = 1;

        info!(
            evicted = %short_hex(&signal.evicted_txid),
            block_hash = %short_hex(&signal.block_hash),
            "[tg-03] Evicted transaction recorded as double spent"
        );
        Ok(outcome)
    }
}
