//! # Reactor Outcomes

use serde::{Deserialize, Serialize};
use shared_bus::DoubleSpendNotification;
use tg_01_tx_store::DoubleSpendRecord;

/// Result of handling one pool-conflict signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConflictOutcome {
    /// The reject code was not a conflict; nothing was done.
    pub ignored: bool,
    /// Attempts inserted (one notification each).
    pub notifications: usize,
    /// Processing stopped at an attempt that was already recorded.
    pub stopped_early: bool,
}

/// Result of handling one pool-eviction signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionOutcome {
    /// The winning block's walk inserted this many blocks.
    pub blocks_ingested: usize,
    pub notifications: usize,
}

/// Build the outbound notification for a stored record.
pub fn notification_from_record(record: DoubleSpendRecord) -> DoubleSpendNotification {
    DoubleSpendNotification {
        tx_id: record.key.tx_id(),
        txid: record.txid,
        conflicting_txid: record.key.conflicting_txid(),
        block: record.key.block_id().zip(record.block_hash),
        payload: record.payload,
        callback: record.callback,
    }
}
