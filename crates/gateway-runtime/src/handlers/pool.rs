//! Pool conflict and pool eviction workers.

use super::next_event;
use gateway_telemetry::{
    log_signal_failure, metric_add, metric_inc, BLOCKS_INSERTED, DOUBLE_SPENDS, SIGNAL_FAILURES,
};
use shared_bus::{GatewayEvent, Subscription};
use shared_types::short_hex;
use std::sync::Arc;
use tg_03_double_spend::DoubleSpendApi;
use tokio::sync::watch;
use tracing::info;

/// Handles `PoolConflict`.
pub struct PoolConflictHandler {
    subscription: Subscription,
    detector: Arc<dyn DoubleSpendApi>,
    shutdown: watch::Receiver<bool>,
}

impl PoolConflictHandler {
    pub fn new(
        subscription: Subscription,
        detector: Arc<dyn DoubleSpendApi>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            subscription,
            detector,
            shutdown,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[tg-03] Pool conflict worker started");
        while let Some(event) = next_event(&mut self.subscription, &mut self.shutdown).await {
            let GatewayEvent::PoolConflict(signal) = event else {
                continue;
            };
            match self.detector.handle_pool_conflict(&signal).await {
                Ok(outcome) => metric_add!(DOUBLE_SPENDS, &["pool"], outcome.notifications),
                Err(e) => {
                    metric_inc!(SIGNAL_FAILURES, &["pool_conflict"]);
                    log_signal_failure!(
                        "pool_conflict",
                        e,
                        rejected = %short_hex(&signal.rejected_txid)
                    );
                }
            }
        }
        info!("[tg-03] Pool conflict worker stopped");
    }
}

/// Handles `PoolEvictedByBlock`.
pub struct PoolEvictionHandler {
    subscription: Subscription,
    detector: Arc<dyn DoubleSpendApi>,
    shutdown: watch::Receiver<bool>,
}

impl PoolEvictionHandler {
    pub fn new(
        subscription: Subscription,
        detector: Arc<dyn DoubleSpendApi>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            subscription,
            detector,
            shutdown,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[tg-03] Pool eviction worker started");
        while let Some(event) = next_event(&mut self.subscription, &mut self.shutdown).await {
            let GatewayEvent::PoolEvictedByBlock(signal) = event else {
                continue;
            };
            match self.detector.handle_pool_eviction(&signal).await {
                Ok(outcome) => {
                    metric_add!(BLOCKS_INSERTED, outcome.blocks_ingested);
                    metric_add!(DOUBLE_SPENDS, &["block"], outcome.notifications);
                }
                Err(e) => {
                    metric_inc!(SIGNAL_FAILURES, &["pool_eviction"]);
                    log_signal_failure!(
                        "pool_eviction",
                        e,
                        evicted = %short_hex(&signal.evicted_txid),
                        block_hash = %short_hex(&signal.block_hash)
                    );
                }
            }
        }
        info!("[tg-03] Pool eviction worker stopped");
    }
}
