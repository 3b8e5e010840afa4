//! # Block Ingestion Coordinator
//!
//! Turns "new block hash" signals into stored block rows and parse events.
//!
//! ## Walk
//!
//! ```text
//! target = discovered hash
//! loop:
//!   stored?                      -> flush, stop
//!   fetch header + best height
//!   too deep below best?         -> flush, stop (block not inserted)
//!   insert row (lost race?)      -> flush, stop
//!   push (id, hash)
//!   prev is genesis or stored?   -> flush, stop
//!   target = prev
//! ```
//!
//! Flushing pops the stack, so parse events go out oldest first. A gateway
//! or store error abandons the walk without flushing; the inserted rows stay
//! unparsed and the maintenance sweep re-queues them.

use crate::config::IngestionConfig;
use crate::domain::{IngestOutcome, IngestionError, WalkStack, WalkStop};
use crate::ports::BlockIngestionApi;
use async_trait::async_trait;
use shared_bus::{EventPublisher, GatewayEvent};
use shared_types::{short_hex, ChainGateway, Hash, ZERO_HASH};
use std::sync::Arc;
use tg_01_tx_store::{NewBlock, TransactionStore};
use tracing::{debug, info, warn};

/// Block Ingestion Coordinator.
pub struct BlockIngestionCoordinator<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    publisher: Arc<dyn EventPublisher>,
    config: IngestionConfig,
}

impl<S: TransactionStore, G: ChainGateway> BlockIngestionCoordinator<S, G> {
    pub fn new(
        store: Arc<S>,
        gateway: Arc<G>,
        publisher: Arc<dyn EventPublisher>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Publish every stacked block, oldest first.
    async fn flush(&self, stack: &mut WalkStack, stop: WalkStop) -> IngestOutcome {
        let tickets = stack.drain_oldest_first();
        let mut inserted = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            self.publisher
                .publish(GatewayEvent::BlockAvailableForParsing {
                    block_id: ticket.block_id,
                    block_hash: ticket.block_hash,
                })
                .await;
            inserted.push((ticket.block_id, ticket.block_hash));
        }
        IngestOutcome { inserted, stop }
    }

    async fn walk(
        &self,
        block_hash: Hash,
        stack: &mut WalkStack,
    ) -> Result<IngestOutcome, IngestionError> {
        let mut target = block_hash;
        loop {
            if self.store.get_block(&target).await?.is_some() {
                let stop = if stack.is_empty() {
                    WalkStop::AlreadyKnown
                } else {
                    WalkStop::Connected
                };
                return Ok(self.flush(stack, stop).await);
            }

            let header = self.gateway.block_header(&target).await?;
            let best_height = self.gateway.best_block_height().await?;

            if header.height.saturating_add(self.config.max_fork_depth) < best_height {
                warn!(
                    block_hash = %short_hex(&target),
                    height = header.height,
                    best_height,
                    max_fork_depth = self.config.max_fork_depth,
                    "[tg-02] Branch too deep below best height, not walking further"
                );
                let stop = WalkStop::ForkTooDeep {
                    height: header.height,
                    best_height,
                };
                return Ok(self.flush(stack, stop).await);
            }

            let Some(block_id) = self.store.insert_block(NewBlock::from(&header)).await? else {
                debug!(block_hash = %short_hex(&target), "[tg-02] Block inserted concurrently");
                return Ok(self.flush(stack, WalkStop::LostRace).await);
            };
            debug!(
                block_hash = %short_hex(&target),
                height = header.height,
                %block_id,
                "[tg-02] Block stored"
            );
            stack.push(block_id, target);

            let prev_hash = header.prev_hash_or_zero();
            if prev_hash == ZERO_HASH {
                return Ok(self.flush(stack, WalkStop::Genesis).await);
            }
            if self.store.get_block(&prev_hash).await?.is_some() {
                return Ok(self.flush(stack, WalkStop::Connected).await);
            }
            target = prev_hash;
        }
    }
}

#[async_trait]
impl<S: TransactionStore, G: ChainGateway> BlockIngestionApi for BlockIngestionCoordinator<S, G> {
    async fn ingest_block(&self, block_hash: Hash) -> Result<IngestOutcome, IngestionError> {
        let mut stack = WalkStack::new();
        match self.walk(block_hash, &mut stack).await {
            Ok(outcome) => {
                if outcome.depth() > 1 {
                    info!(
                        block_hash = %short_hex(&block_hash),
                        backfilled = outcome.depth(),
                        "[tg-02] Backfilled missing ancestors"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    block_hash = %short_hex(&block_hash),
                    stranded = stack.len(),
                    error = %e,
                    "[tg-02] Discovery abandoned"
                );
                Err(e)
            }
        }
    }
}
