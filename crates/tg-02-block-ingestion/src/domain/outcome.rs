//! # Outcomes
//!
//! What one discovery, parse or sweep did. The runtime turns these into
//! metrics and log lines.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, Hash};
use std::time::Duration;

/// Why a backward walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkStop {
    /// The discovered hash was already stored.
    AlreadyKnown,
    /// The walk reached a stored block.
    Connected,
    /// The walk reached genesis.
    Genesis,
    /// The next block sat more than the maximum fork depth below the best height.
    ForkTooDeep { height: u64, best_height: u64 },
    /// A concurrent discovery inserted the block first.
    LostRace,
}

/// Result of `ingest_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Blocks inserted by this walk, oldest first.
    pub inserted: Vec<(BlockId, Hash)>,
    pub stop: WalkStop,
}

impl IngestOutcome {
    pub fn already_known() -> Self {
        Self {
            inserted: Vec::new(),
            stop: WalkStop::AlreadyKnown,
        }
    }

    /// Number of blocks the walk inserted.
    pub fn depth(&self) -> usize {
        self.inserted.len()
    }
}

/// Counts from one completed parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Links created for tracked transactions.
    pub linked: usize,
    pub merkle_notifications: usize,
    pub double_spend_notifications: usize,
    /// The merkle phase had already completed.
    pub merkle_skipped: bool,
    /// The double-spend phase had already completed.
    pub scan_skipped: bool,
}

/// Result of `BlockParser::parse_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseOutcome {
    Parsed(ParseReport),
    /// The same hash is already being parsed.
    Duplicate,
    /// The block row or content has vanished; nothing to do.
    NotFound,
    /// Content did not parse. The block stays unmarked for the sweep.
    Malformed(String),
}

/// Snapshot of the parser's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStatus {
    pub blocks_parsed: u64,
    pub duplicates_suppressed: u64,
    pub failures: u64,
    pub total_parse_time: Duration,
    pub in_flight: usize,
}

/// Result of one maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Blocks re-published for parsing.
    pub requeued: usize,
}
