//! # Walk Stack
//!
//! LIFO of blocks found during one backward walk. The walk discovers blocks
//! newest first and pushes each one; draining pops them, which yields the
//! oldest block first.

use shared_types::{BlockId, Hash};

/// A block ready to be handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTicket {
    pub block_id: BlockId,
    pub block_hash: Hash,
}

/// Per-walk ordering stack. Never shared between walks.
#[derive(Debug, Default)]
pub struct WalkStack {
    entries: Vec<ParseTicket>,
}

impl WalkStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block_id: BlockId, block_hash: Hash) {
        self.entries.push(ParseTicket {
            block_id,
            block_hash,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop every entry, oldest (last pushed) first.
    pub fn drain_oldest_first(&mut self) -> Vec<ParseTicket> {
        std::iter::from_fn(|| self.entries.pop()).collect()
    }
}
