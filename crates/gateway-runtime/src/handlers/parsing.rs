//! Block parsing worker.

use super::next_event;
use gateway_telemetry::{
    log_signal_failure, metric_add, metric_inc, time_histogram, BLOCKS_PARSED, DOUBLE_SPENDS,
    MERKLE_NOTIFICATIONS, PARSE_DURATION, SIGNAL_FAILURES,
};
use shared_bus::{GatewayEvent, Subscription};
use shared_types::{short_hex, ChainGateway};
use std::sync::Arc;
use tg_01_tx_store::TransactionStore;
use tg_02_block_ingestion::{BlockParser, ParseOutcome};
use tokio::sync::watch;
use tracing::info;

/// Handles `BlockAvailableForParsing`.
pub struct ParsingHandler<S, G> {
    subscription: Subscription,
    parser: Arc<BlockParser<S, G>>,
    shutdown: watch::Receiver<bool>,
}

impl<S: TransactionStore, G: ChainGateway> ParsingHandler<S, G> {
    pub fn new(
        subscription: Subscription,
        parser: Arc<BlockParser<S, G>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            subscription,
            parser,
            shutdown,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[tg-02] Block parsing worker started");
        while let Some(event) = next_event(&mut self.subscription, &mut self.shutdown).await {
            let GatewayEvent::BlockAvailableForParsing { block_id, block_hash } = event else {
                continue;
            };

            let _timer = time_histogram!(PARSE_DURATION);
            match self.parser.parse_block(block_id, block_hash).await {
                Ok(ParseOutcome::Parsed(report)) => {
                    metric_inc!(BLOCKS_PARSED);
                    metric_add!(MERKLE_NOTIFICATIONS, report.merkle_notifications);
                    metric_add!(DOUBLE_SPENDS, &["block"], report.double_spend_notifications);
                }
                Ok(ParseOutcome::Malformed(reason)) => {
                    metric_inc!(SIGNAL_FAILURES, &["block_parsing"]);
                    log_signal_failure!(
                        "block_parsing",
                        reason,
                        block_hash = %short_hex(&block_hash)
                    );
                }
                Ok(ParseOutcome::Duplicate | ParseOutcome::NotFound) => {}
                Err(e) => {
                    metric_inc!(SIGNAL_FAILURES, &["block_parsing"]);
                    log_signal_failure!("block_parsing", e, block_hash = %short_hex(&block_hash));
                }
            }
        }
        info!("[tg-02] Block parsing worker stopped");
    }
}
