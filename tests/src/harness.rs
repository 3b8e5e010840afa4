//! # Engine Harness
//!
//! The full subsystem graph over in-memory adapters, without spawned
//! workers. Tests drive it step by step: announce a block, then `pump` the
//! parse queue until it is empty.

use shared_bus::{
    DoubleSpendNotification, EventFilter, EventTopic, GatewayEvent, InMemoryEventBus,
    MerkleProofNotification, Subscription,
};
use shared_types::{BlockContent, BlockId, Hash, InMemoryChainGateway, OutPoint, TxId};
use std::sync::Arc;
use tg_01_tx_store::{
    BlockRecord, InMemoryTransactionStore, NewTrackedTransaction, TransactionStore,
};
use tg_02_block_ingestion::{
    BlockConflictScanner, BlockIngestionApi, BlockIngestionCoordinator, BlockParser,
    IngestOutcome, IngestionConfig, IngestionError, MaintenanceSweep, ParseOutcome, SweepOutcome,
};
use tg_03_double_spend::{DoubleSpendConfig, DoubleSpendDetector};

pub type Store = InMemoryTransactionStore;
pub type Gateway = InMemoryChainGateway;

pub struct EngineHarness {
    pub store: Arc<Store>,
    pub gateway: Arc<Gateway>,
    pub bus: Arc<InMemoryEventBus>,
    pub coordinator: Arc<BlockIngestionCoordinator<Store, Gateway>>,
    pub detector: Arc<DoubleSpendDetector<Store>>,
    pub parser: BlockParser<Store, Gateway>,
    pub sweep: MaintenanceSweep<Store>,
    parse_queue: Subscription,
    notifications: Subscription,
    double_spends: Vec<DoubleSpendNotification>,
    merkle_proofs: Vec<MerkleProofNotification>,
    /// Every block id published for parsing, in publication order.
    pub parse_log: Vec<(BlockId, Hash)>,
}

impl EngineHarness {
    pub fn new(ingestion: IngestionConfig, double_spend: DoubleSpendConfig) -> Self {
        let store = Arc::new(Store::new());
        let gateway = Arc::new(Gateway::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let parse_queue = bus.subscribe(EventFilter::topic(EventTopic::BlockParsing));
        let notifications = bus.subscribe(EventFilter::topic(EventTopic::Notification));

        let coordinator = Arc::new(BlockIngestionCoordinator::new(
            store.clone(),
            gateway.clone(),
            bus.clone(),
            ingestion.clone(),
        ));
        let ingestion_api: Arc<dyn BlockIngestionApi> = coordinator.clone();
        let detector = Arc::new(DoubleSpendDetector::new(
            store.clone(),
            bus.clone(),
            ingestion_api,
            double_spend,
        ));
        let scanner: Arc<dyn BlockConflictScanner> = detector.clone();
        let parser = BlockParser::new(store.clone(), gateway.clone(), bus.clone(), scanner);
        let sweep = MaintenanceSweep::new(store.clone(), bus.clone(), ingestion);

        Self {
            store,
            gateway,
            bus,
            coordinator,
            detector,
            parser,
            sweep,
            parse_queue,
            notifications,
            double_spends: Vec::new(),
            merkle_proofs: Vec::new(),
            parse_log: Vec::new(),
        }
    }

    /// Testing windows: fork depth 10, fork-root delta 6.
    pub fn for_testing() -> Self {
        Self::new(IngestionConfig::for_testing(), DoubleSpendConfig::for_testing())
    }

    pub fn publish_chain(&self, blocks: &[BlockContent]) {
        for block in blocks {
            self.gateway.add_block(block.clone());
        }
    }

    pub async fn track(&self, txid: Hash, inputs: Vec<OutPoint>, double_spend_check: bool) -> TxId {
        self.store
            .insert_tracked_transaction(NewTrackedTransaction {
                txid,
                payload: Some(txid[..4].to_vec()),
                double_spend_check,
                inputs,
                ..NewTrackedTransaction::default()
            })
            .await
            .expect("tracked insert")
    }

    /// Announce a block hash and parse everything it queued.
    pub async fn announce(&mut self, hash: Hash) -> IngestOutcome {
        let outcome = self
            .coordinator
            .ingest_block(hash)
            .await
            .expect("ingestion failed");
        self.pump().await;
        outcome
    }

    /// Parse queued blocks until the queue is empty.
    pub async fn pump(&mut self) -> Vec<Result<ParseOutcome, IngestionError>> {
        let mut outcomes = Vec::new();
        while let Some(GatewayEvent::BlockAvailableForParsing {
            block_id,
            block_hash,
        }) = self.parse_queue.try_recv().expect("parse queue closed")
        {
            self.parse_log.push((block_id, block_hash));
            outcomes.push(self.parser.parse_block(block_id, block_hash).await);
        }
        outcomes
    }

    pub async fn run_sweep(&mut self) -> SweepOutcome {
        let outcome = self.sweep.run_once().await.expect("sweep failed");
        self.pump().await;
        outcome
    }

    pub async fn block(&self, hash: &Hash) -> Option<BlockRecord> {
        self.store.get_block(hash).await.expect("store read")
    }

    /// Double-spend notifications emitted since the last call.
    pub fn double_spend_notifications(&mut self) -> Vec<DoubleSpendNotification> {
        self.collect_notifications();
        std::mem::take(&mut self.double_spends)
    }

    /// Merkle-proof notifications emitted since the last call.
    pub fn merkle_notifications(&mut self) -> Vec<MerkleProofNotification> {
        self.collect_notifications();
        std::mem::take(&mut self.merkle_proofs)
    }

    fn collect_notifications(&mut self) {
        for event in self.notifications.drain() {
            match event {
                GatewayEvent::DoubleSpendDetected(n) => self.double_spends.push(n),
                GatewayEvent::MerkleProofReady(n) => self.merkle_proofs.push(n),
                _ => {}
            }
        }
    }
}
