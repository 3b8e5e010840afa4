//! # Inbound Ports
//!
//! Reactive entry points fed by node notification plumbing. The block scan
//! is reached through `tg_02_block_ingestion::BlockConflictScanner`.

use crate::domain::{DoubleSpendError, EvictionOutcome, PoolConflictOutcome};
use async_trait::async_trait;
use shared_bus::{PoolConflictSignal, PoolEvictionSignal};

#[async_trait]
pub trait DoubleSpendApi: Send + Sync {
    /// A submission was rejected because it collides with pool
    /// transactions. Records one pool-level attempt per watched transaction
    /// among the colliding ones and their descendants.
    async fn handle_pool_conflict(
        &self,
        signal: &PoolConflictSignal,
    ) -> Result<PoolConflictOutcome, DoubleSpendError>;

    /// A pool transaction was evicted by a block transaction. Ingests the
    /// winning block first, then records the conflict against it.
    async fn handle_pool_eviction(
        &self,
        signal: &PoolEvictionSignal,
    ) -> Result<EvictionOutcome, DoubleSpendError>;
}
