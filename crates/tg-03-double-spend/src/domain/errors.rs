//! # Double-Spend Errors

use thiserror::Error;
use tg_01_tx_store::StoreError;
use tg_02_block_ingestion::IngestionError;

/// Errors from the reactive paths. Each one is scoped to a single signal.
#[derive(Debug, Error)]
pub enum DoubleSpendError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Ingesting the winning block of an eviction failed.
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
}

impl DoubleSpendError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Ingestion(e) => e.is_transient(),
        }
    }
}
