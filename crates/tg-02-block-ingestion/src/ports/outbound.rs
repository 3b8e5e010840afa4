//! # Outbound Ports
//!
//! The double-spend block scan, invoked once per parsed block.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{BlockContent, BlockId};
use tg_01_tx_store::{BlockRecord, StoreError};

/// Scans a parsed block for conflicting spends.
#[async_trait]
pub trait BlockConflictScanner: Send + Sync {
    /// Scan `content` of the stored `block`.
    ///
    /// # Returns
    /// The number of double-spend notifications emitted.
    async fn scan_block(
        &self,
        block: &BlockRecord,
        content: &BlockContent,
    ) -> Result<usize, StoreError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Scanner that records the blocks it was asked to scan.
#[derive(Default)]
pub struct RecordingScanner {
    scanned: Mutex<Vec<BlockId>>,
    /// Fail every call with a transient store error.
    pub should_fail: bool,
}

impl RecordingScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Blocks scanned so far, in call order.
    pub fn scanned(&self) -> Vec<BlockId> {
        self.scanned.lock().clone()
    }
}

#[async_trait]
impl BlockConflictScanner for RecordingScanner {
    async fn scan_block(
        &self,
        block: &BlockRecord,
        _content: &BlockContent,
    ) -> Result<usize, StoreError> {
        if self.should_fail {
            return Err(StoreError::Database("Mock failure".to_string()));
        }
        self.scanned.lock().push(block.id);
        Ok(0)
    }
}
