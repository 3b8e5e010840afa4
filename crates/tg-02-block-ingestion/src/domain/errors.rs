//! # Ingestion Errors

use shared_types::GatewayError;
use thiserror::Error;
use tg_01_tx_store::StoreError;

/// Errors from discovery, parsing and the maintenance sweep.
///
/// None of them is fatal: the caller logs and moves on to the next signal.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Remote node failure. The block stays unmarked and is retried later.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Store failure left after the store's own retries.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestionError {
    /// Whether a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
        }
    }
}
