//! # Engine Runtime
//!
//! Wires store, chain gateway and subsystems to the event bus.
//!
//! ```text
//! NewBlockDiscovered ──→ [discovery]  ──→ BlockAvailableForParsing
//! maintenance timer  ──→ [sweep]      ──→ BlockAvailableForParsing
//! BlockAvailableForParsing ──→ [parsing] ──→ MerkleProofReady / DoubleSpendDetected
//! PoolConflict       ──→ [conflict]   ──→ DoubleSpendDetected
//! PoolEvictedByBlock ──→ [eviction]   ──→ BlockAvailableForParsing / DoubleSpendDetected
//! ```

use crate::config::EngineConfig;
use crate::handlers::{
    DiscoveryHandler, MaintenanceTask, ParsingHandler, PoolConflictHandler, PoolEvictionHandler,
};
use gateway_telemetry::{gather_metrics, register_metrics, TelemetryError};
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, Subscription};
use shared_types::ChainGateway;
use std::sync::Arc;
use std::time::Duration;
use tg_01_tx_store::TransactionStore;
use tg_02_block_ingestion::{
    BlockConflictScanner, BlockIngestionApi, BlockIngestionCoordinator, BlockParser,
    MaintenanceSweep, ParserStatus,
};
use tg_03_double_spend::{DoubleSpendApi, DoubleSpendDetector, NotificationReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The running engine.
pub struct EngineRuntime<S, G> {
    bus: Arc<InMemoryEventBus>,
    parser: Arc<BlockParser<S, G>>,
    reader: NotificationReader<S>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl<S, G> EngineRuntime<S, G>
where
    S: TransactionStore + 'static,
    G: ChainGateway + 'static,
{
    /// Build every subsystem and spawn one worker per signal type plus the
    /// maintenance sweep. Must be called inside a Tokio runtime.
    pub fn start(config: &EngineConfig, store: Arc<S>, gateway: Arc<G>) -> Self {
        info!("===========================================");
        info!("  Transaction Gateway Engine v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if let Err(e) = register_metrics() {
            warn!("Metrics unavailable: {}", e);
        }

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.channel_capacity));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let coordinator: Arc<dyn BlockIngestionApi> = Arc::new(BlockIngestionCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            bus.clone(),
            config.ingestion.clone(),
        ));
        let detector = Arc::new(DoubleSpendDetector::new(
            Arc::clone(&store),
            bus.clone(),
            Arc::clone(&coordinator),
            config.double_spend.clone(),
        ));
        let scanner: Arc<dyn BlockConflictScanner> = detector.clone();
        let reactor: Arc<dyn DoubleSpendApi> = detector;
        let parser = Arc::new(BlockParser::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            bus.clone(),
            scanner,
        ));
        let sweep =
            MaintenanceSweep::new(Arc::clone(&store), bus.clone(), config.ingestion.clone());

        // Subscribe everything before any worker can publish.
        let discovery = DiscoveryHandler::new(
            bus.subscribe(EventFilter::topic(EventTopic::BlockDiscovery)),
            coordinator,
            shutdown_rx.clone(),
        );
        let parsing = ParsingHandler::new(
            bus.subscribe(EventFilter::topic(EventTopic::BlockParsing)),
            Arc::clone(&parser),
            shutdown_rx.clone(),
        );
        let conflict = PoolConflictHandler::new(
            bus.subscribe(EventFilter::topic(EventTopic::PoolConflict)),
            Arc::clone(&reactor),
            shutdown_rx.clone(),
        );
        let eviction = PoolEvictionHandler::new(
            bus.subscribe(EventFilter::topic(EventTopic::PoolEviction)),
            reactor,
            shutdown_rx.clone(),
        );
        let maintenance = MaintenanceTask::new(
            sweep,
            Duration::from_secs(config.ingestion.maintenance_interval_secs),
            shutdown_rx,
        );

        let workers = vec![
            tokio::spawn(discovery.run()),
            tokio::spawn(parsing.run()),
            tokio::spawn(conflict.run()),
            tokio::spawn(eviction.run()),
            tokio::spawn(maintenance.run()),
        ];
        info!(workers = workers.len(), "Engine workers started");

        Self {
            bus,
            parser,
            reader: NotificationReader::new(store),
            shutdown_tx,
            workers,
        }
    }

    /// The bus inbound node signals are published on.
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Ordered stream of `MerkleProofReady` and `DoubleSpendDetected`
    /// events for the callback dispatcher.
    pub fn subscribe_notifications(&self) -> Subscription {
        self.bus.subscribe(EventFilter::topic(EventTopic::Notification))
    }

    pub fn notification_reader(&self) -> &NotificationReader<S> {
        &self.reader
    }

    pub fn parser_status(&self) -> ParserStatus {
        self.parser.status()
    }

    /// Engine metrics in Prometheus text exposition format, for whatever
    /// scrape endpoint the host process serves.
    pub fn metrics_text(&self) -> Result<String, TelemetryError> {
        gather_metrics()
    }

    /// Signal every worker and wait for them. An event already being
    /// handled runs to completion first.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("Worker terminated abnormally: {}", e);
            }
        }
        info!("Shutdown complete");
    }
}
