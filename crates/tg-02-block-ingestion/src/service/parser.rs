//! # Block Parser
//!
//! Handles "block available for parsing" events. Two phases, each guarded by
//! its own marker on the block row so a re-parse only redoes what is missing:
//!
//! 1. Merkle: link tracked transactions found in the block, notify those that
//!    asked for a proof, set `parsed_for_merkle_at`.
//! 2. Double spend: run the conflict scan, set `parsed_for_double_spend_at`.

use crate::domain::{IngestionError, InFlightSet, ParseOutcome, ParseReport, ParserStatus};
use crate::ports::BlockConflictScanner;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, GatewayEvent, MerkleProofNotification};
use shared_types::{short_hex, BlockId, ChainGateway, GatewayError, Hash};
use std::sync::Arc;
use std::time::Instant;
use tg_01_tx_store::TransactionStore;
use tracing::{debug, error, warn};

/// Content parser with in-flight deduplication.
pub struct BlockParser<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    publisher: Arc<dyn EventPublisher>,
    scanner: Arc<dyn BlockConflictScanner>,
    in_flight: InFlightSet,
    status: Mutex<ParserStatus>,
}

impl<S: TransactionStore, G: ChainGateway> BlockParser<S, G> {
    pub fn new(
        store: Arc<S>,
        gateway: Arc<G>,
        publisher: Arc<dyn EventPublisher>,
        scanner: Arc<dyn BlockConflictScanner>,
    ) -> Self {
        Self {
            store,
            gateway,
            publisher,
            scanner,
            in_flight: InFlightSet::new(),
            status: Mutex::new(ParserStatus::default()),
        }
    }

    /// Snapshot of the parser counters.
    pub fn status(&self) -> ParserStatus {
        let mut status = self.status.lock().clone();
        status.in_flight = self.in_flight.len();
        status
    }

    /// Parse one block. A second call for a hash already in flight returns
    /// `ParseOutcome::Duplicate` without touching the store.
    pub async fn parse_block(
        &self,
        block_id: BlockId,
        block_hash: Hash,
    ) -> Result<ParseOutcome, IngestionError> {
        let Some(_claim) = self.in_flight.try_claim(block_hash) else {
            debug!(block_hash = %short_hex(&block_hash), "[tg-02] Parse already in flight");
            self.status.lock().duplicates_suppressed += 1;
            return Ok(ParseOutcome::Duplicate);
        };

        let started = Instant::now();
        let result = self.parse_claimed(block_id, block_hash).await;

        let mut status = self.status.lock();
        status.total_parse_time += started.elapsed();
        match &result {
            Ok(ParseOutcome::Parsed(_)) => status.blocks_parsed += 1,
            Ok(ParseOutcome::Malformed(_)) | Err(_) => status.failures += 1,
            Ok(ParseOutcome::Duplicate | ParseOutcome::NotFound) => {}
        }
        result
    }

    async fn parse_claimed(
        &self,
        block_id: BlockId,
        block_hash: Hash,
    ) -> Result<ParseOutcome, IngestionError> {
        let block = match self.store.get_block_by_id(block_id).await? {
            Some(block) if block.hash == block_hash => block,
            Some(_) | None => {
                warn!(%block_id, block_hash = %short_hex(&block_hash), "[tg-02] Block row missing");
                return Ok(ParseOutcome::NotFound);
            }
        };

        let mut report = ParseReport {
            merkle_skipped: block.parsed_for_merkle_at.is_some(),
            scan_skipped: block.parsed_for_double_spend_at.is_some(),
            ..ParseReport::default()
        };
        if report.merkle_skipped && report.scan_skipped {
            return Ok(ParseOutcome::Parsed(report));
        }

        let content = match self.gateway.block_content(&block_hash).await {
            Ok(content) => content,
            Err(GatewayError::NotFound(_)) => {
                debug!(block_hash = %short_hex(&block_hash), "[tg-02] Block content vanished");
                return Ok(ParseOutcome::NotFound);
            }
            Err(GatewayError::MalformedPayload { reason, .. }) => {
                error!(
                    block_hash = %short_hex(&block_hash),
                    %reason,
                    "[tg-02] Malformed block content, leaving block unparsed"
                );
                return Ok(ParseOutcome::Malformed(reason));
            }
            Err(e) => return Err(e.into()),
        };

        if !report.merkle_skipped {
            let linked = self
                .store
                .link_transactions_to_block(block.id, &content.txids())
                .await?;
            report.linked = linked.len();

            for link in linked.into_iter().filter(|l| l.merkle_proof_requested) {
                self.publisher
                    .publish(GatewayEvent::MerkleProofReady(MerkleProofNotification {
                        tx_id: link.tx_id,
                        txid: link.txid,
                        block_id: block.id,
                        block_hash,
                        callback: link.callback,
                    }))
                    .await;
                report.merkle_notifications += 1;
            }
            self.store.set_block_parsed_for_merkle(block.id).await?;
        }

        if !report.scan_skipped {
            report.double_spend_notifications = self.scanner.scan_block(&block, &content).await?;
            self.store.set_block_parsed_for_double_spend(block.id).await?;
        }

        debug!(
            block_hash = %short_hex(&block_hash),
            height = ?block.height,
            linked = report.linked,
            merkle = report.merkle_notifications,
            double_spends = report.double_spend_notifications,
            "[tg-02] Block parsed"
        );
        Ok(ParseOutcome::Parsed(report))
    }
}
