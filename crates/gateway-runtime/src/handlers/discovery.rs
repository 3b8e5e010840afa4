//! Block discovery worker.

use super::next_event;
use gateway_telemetry::{
    log_signal_failure, metric_add, metric_inc, BLOCKS_INSERTED, FORK_DEPTH_ABORTS,
    SIGNAL_FAILURES, WALK_DEPTH,
};
use shared_bus::{GatewayEvent, Subscription};
use shared_types::short_hex;
use std::sync::Arc;
use tg_02_block_ingestion::{BlockIngestionApi, IngestOutcome, WalkStop};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Handles `NewBlockDiscovered`.
pub struct DiscoveryHandler {
    subscription: Subscription,
    ingestion: Arc<dyn BlockIngestionApi>,
    shutdown: watch::Receiver<bool>,
}

impl DiscoveryHandler {
    pub fn new(
        subscription: Subscription,
        ingestion: Arc<dyn BlockIngestionApi>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            subscription,
            ingestion,
            shutdown,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[tg-02] Block discovery worker started");
        while let Some(event) = next_event(&mut self.subscription, &mut self.shutdown).await {
            let GatewayEvent::NewBlockDiscovered { block_hash, timestamp } = event else {
                continue;
            };
            debug!(block_hash = %short_hex(&block_hash), timestamp, "[tg-02] Block announced");

            match self.ingestion.ingest_block(block_hash).await {
                Ok(outcome) => record(&outcome),
                Err(e) => {
                    metric_inc!(SIGNAL_FAILURES, &["block_discovery"]);
                    log_signal_failure!("block_discovery", e, block_hash = %short_hex(&block_hash));
                }
            }
        }
        info!("[tg-02] Block discovery worker stopped");
    }
}

fn record(outcome: &IngestOutcome) {
    let depth = outcome.depth();
    if depth > 0 {
        metric_add!(BLOCKS_INSERTED, depth);
        WALK_DEPTH.observe(depth as f64);
    }
    if let WalkStop::ForkTooDeep { height, best_height } = outcome.stop {
        metric_inc!(FORK_DEPTH_ABORTS);
        warn!(height, best_height, "[tg-02] Discovery stopped at maximum fork depth");
    }
}
