//! Periodic maintenance sweep.

use gateway_telemetry::{
    log_signal_failure, metric_add, metric_inc, BLOCKS_REQUEUED, SIGNAL_FAILURES,
};
use std::sync::Arc;
use std::time::Duration;
use tg_01_tx_store::TransactionStore;
use tg_02_block_ingestion::MaintenanceSweep;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Runs the unparsed-block sweep on a fixed interval, first at startup.
pub struct MaintenanceTask<S> {
    sweep: MaintenanceSweep<S>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<S: TransactionStore> MaintenanceTask<S> {
    pub fn new(
        sweep: MaintenanceSweep<S>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sweep,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "[tg-02] Maintenance sweep started");
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            match self.sweep.run_once().await {
                Ok(outcome) => metric_add!(BLOCKS_REQUEUED, outcome.requeued),
                Err(e) => {
                    metric_inc!(SIGNAL_FAILURES, &["maintenance"]);
                    log_signal_failure!("maintenance", e);
                }
            }
        }
        info!("[tg-02] Maintenance sweep stopped");
    }
}
