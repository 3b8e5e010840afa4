//! # Engine Events
//!
//! Every signal that flows through the shared bus, inbound (from the node
//! notification plumbing) and outbound (to the callback dispatcher).

use serde::{Deserialize, Serialize};
use shared_types::entities::{BlockId, CallbackTarget, Hash, TxId};

/// Why a node rejected a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectCode {
    /// The transaction conflicts with one already in the node's pool.
    MempoolConflict,
    /// The node flagged the submission as a double spend.
    DoubleSpendDetected,
    /// Any other rejection; not a conflict signal.
    Other(String),
}

impl RejectCode {
    /// Whether this rejection names colliding transactions worth reporting.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::MempoolConflict | Self::DoubleSpendDetected)
    }
}

/// A submission was rejected because it collides with pool transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConflictSignal {
    /// The rejected (conflicting) transaction.
    pub rejected_txid: Hash,
    pub reject_code: RejectCode,
    /// Pool transactions the rejected one collides with.
    pub colliding_txids: Vec<Hash>,
    /// Raw bytes of the rejected transaction, when the node supplied them.
    pub raw_payload: Option<Vec<u8>>,
}

/// A pool transaction was evicted because a block transaction collided with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvictionSignal {
    pub evicted_txid: Hash,
    /// Block that won.
    pub block_hash: Hash,
    /// Transaction in that block that spent the same outputs.
    pub colliding_txid: Hash,
    pub colliding_payload: Vec<u8>,
}

/// A tracked transaction was linked to a block and asked for a merkle proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProofNotification {
    pub tx_id: TxId,
    pub txid: Hash,
    pub block_id: BlockId,
    pub block_hash: Hash,
    pub callback: CallbackTarget,
}

/// Snapshot of one double-spend record, emitted once per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleSpendNotification {
    pub tx_id: TxId,
    pub txid: Hash,
    pub conflicting_txid: Hash,
    /// `None` for pool-level attempts.
    pub block: Option<(BlockId, Hash)>,
    pub payload: Option<Vec<u8>>,
    pub callback: CallbackTarget,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    // =========================================================================
    // INBOUND: node notification plumbing
    // =========================================================================
    /// A node announced a block hash.
    NewBlockDiscovered { block_hash: Hash, timestamp: u64 },

    /// A node rejected a submission with a pool-conflict reason.
    PoolConflict(PoolConflictSignal),

    /// A node evicted a pool transaction in favour of a block transaction.
    PoolEvictedByBlock(PoolEvictionSignal),

    // =========================================================================
    // INTERNAL: ingestion -> parsing
    // =========================================================================
    /// A block row exists and its content may be parsed.
    BlockAvailableForParsing { block_id: BlockId, block_hash: Hash },

    // =========================================================================
    // OUTBOUND: callback dispatcher
    // =========================================================================
    MerkleProofReady(MerkleProofNotification),

    DoubleSpendDetected(DoubleSpendNotification),
}

impl GatewayEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NewBlockDiscovered { .. } => EventTopic::BlockDiscovery,
            Self::BlockAvailableForParsing { .. } => EventTopic::BlockParsing,
            Self::PoolConflict(_) => EventTopic::PoolConflict,
            Self::PoolEvictedByBlock(_) => EventTopic::PoolEviction,
            Self::MerkleProofReady(_) | Self::DoubleSpendDetected(_) => EventTopic::Notification,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    BlockDiscovery,
    BlockParsing,
    PoolConflict,
    PoolEviction,
    /// Merkle-proof and double-spend notifications for the dispatcher.
    Notification,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: EventTopic) -> Self {
        Self::topics(vec![topic])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &GatewayEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
