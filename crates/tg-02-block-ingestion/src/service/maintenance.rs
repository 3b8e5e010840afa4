//! # Maintenance Sweep
//!
//! Re-queues blocks whose parse never finished (crash mid-parse, malformed
//! content, transient node failure). Re-parse is idempotent, so a block that
//! is merely slow gets parsed twice at worst.

use crate::config::IngestionConfig;
use crate::domain::{IngestionError, SweepOutcome};
use shared_bus::{EventPublisher, GatewayEvent};
use shared_types::{now_secs, short_hex};
use std::sync::Arc;
use tg_01_tx_store::TransactionStore;
use tracing::{debug, info};

pub struct MaintenanceSweep<S> {
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    config: IngestionConfig,
}

impl<S: TransactionStore> MaintenanceSweep<S> {
    pub fn new(store: Arc<S>, publisher: Arc<dyn EventPublisher>, config: IngestionConfig) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// Re-publish every block left unparsed for longer than the timeout,
    /// lowest height first.
    pub async fn run_once(&self) -> Result<SweepOutcome, IngestionError> {
        let cutoff = now_secs().saturating_sub(self.config.unparsed_block_timeout_secs);
        let stale = self.store.get_unparsed_blocks(cutoff).await?;

        for block in &stale {
            debug!(
                block_hash = %short_hex(&block.hash),
                height = ?block.height,
                "[tg-02] Re-queueing unparsed block"
            );
            self.publisher
                .publish(GatewayEvent::BlockAvailableForParsing {
                    block_id: block.id,
                    block_hash: block.hash,
                })
                .await;
        }

        if !stale.is_empty() {
            info!(requeued = stale.len(), "[tg-02] Maintenance sweep re-queued blocks");
        }
        Ok(SweepOutcome {
            requeued: stale.len(),
        })
    }
}
