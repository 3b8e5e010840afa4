//! # Inbound Ports
//!
//! API offered to the runtime and to the double-spend detector.

use crate::domain::{IngestOutcome, IngestionError};
use async_trait::async_trait;
use shared_types::Hash;

/// Block ingestion entry point.
#[async_trait]
pub trait BlockIngestionApi: Send + Sync {
    /// Handle a newly discovered block hash: walk back to a stored ancestor,
    /// insert the missing blocks and publish them for parsing oldest first.
    ///
    /// A no-op when the hash is already stored.
    async fn ingest_block(&self, block_hash: Hash) -> Result<IngestOutcome, IngestionError>;
}
