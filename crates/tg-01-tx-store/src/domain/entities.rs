//! # Store Entities
//!
//! Persisted rows: blocks, tracked transactions and their inputs, block links
//! and the two kinds of double-spend record.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeader, BlockId, CallbackTarget, Hash, OutPoint, TxId};

// =============================================================================
// Blocks
// =============================================================================

/// Arguments of `insert_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub hash: Hash,
    /// Previous-block hash; the zero hash for genesis.
    pub prev_hash: Hash,
    pub height: Option<u64>,
    pub timestamp: u64,
}

impl From<&BlockHeader> for NewBlock {
    fn from(header: &BlockHeader) -> Self {
        Self {
            hash: header.hash,
            prev_hash: header.prev_hash_or_zero(),
            height: Some(header.height),
            timestamp: header.timestamp,
        }
    }
}

/// A stored block row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub hash: Hash,
    pub prev_hash: Hash,
    /// Unknown until a header reports it.
    pub height: Option<u64>,
    pub timestamp: u64,
    pub on_active_chain: bool,
    /// When the row was first inserted (seconds since epoch).
    pub inserted_at: u64,
    pub parsed_for_merkle_at: Option<u64>,
    pub parsed_for_double_spend_at: Option<u64>,
}

impl BlockRecord {
    /// Both parse phases have completed.
    pub fn is_fully_parsed(&self) -> bool {
        self.parsed_for_merkle_at.is_some() && self.parsed_for_double_spend_at.is_some()
    }
}

// =============================================================================
// Tracked transactions
// =============================================================================

/// One input of a tracked transaction, kept for conflict matching only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedInput {
    /// Position among the transaction's inputs.
    pub index: u32,
    pub prev_txid: Hash,
    pub prev_vout: u32,
}

impl TrackedInput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_txid, self.prev_vout)
    }
}

/// Arguments of `insert_tracked_transaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrackedTransaction {
    pub txid: Hash,
    pub payload: Option<Vec<u8>>,
    pub double_spend_check: bool,
    /// Requested merkle-proof format, `None` when no proof was requested.
    pub merkle_proof_format: Option<String>,
    pub callback: CallbackTarget,
    pub received_at: u64,
    /// Spent outputs, in input order.
    pub inputs: Vec<OutPoint>,
}

/// A stored tracked transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTransaction {
    pub id: TxId,
    pub txid: Hash,
    /// Absent for transactions known only as ancestors.
    pub payload: Option<Vec<u8>>,
    pub double_spend_check: bool,
    pub merkle_proof_format: Option<String>,
    pub callback: CallbackTarget,
    pub received_at: u64,
    /// Inserted only because a watched transaction spends one of its outputs.
    pub unconfirmed_ancestor: bool,
    pub inputs: Vec<TrackedInput>,
}

impl TrackedTransaction {
    pub fn merkle_proof_requested(&self) -> bool {
        self.merkle_proof_format.is_some()
    }

    /// Whether any input spends `outpoint`.
    pub fn spends(&self, outpoint: &OutPoint) -> bool {
        self.inputs.iter().any(|input| &input.outpoint() == outpoint)
    }
}

// =============================================================================
// Block links
// =============================================================================

/// A tracked transaction found inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTxLink {
    pub block_id: BlockId,
    pub tx_id: TxId,
    pub merkle_proof_sent_at: Option<u64>,
}

/// A link created by `link_transactions_to_block`, joined with what the
/// merkle-proof notification needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTransaction {
    pub tx_id: TxId,
    pub txid: Hash,
    pub merkle_proof_requested: bool,
    pub callback: CallbackTarget,
}

/// A link whose merkle-proof notification has not been acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProofRecord {
    pub tx_id: TxId,
    pub txid: Hash,
    pub block_id: BlockId,
    pub block_hash: Hash,
    pub callback: CallbackTarget,
}

// =============================================================================
// Double-spend records
// =============================================================================

/// Selects block-level or pool-level double-spend records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoubleSpendKind {
    Block,
    Pool,
}

/// Uniqueness key of a double-spend record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DoubleSpendKey {
    Block {
        tx_id: TxId,
        block_id: BlockId,
        conflicting_txid: Hash,
    },
    Pool {
        tx_id: TxId,
        conflicting_txid: Hash,
    },
}

impl DoubleSpendKey {
    pub fn kind(&self) -> DoubleSpendKind {
        match self {
            Self::Block { .. } => DoubleSpendKind::Block,
            Self::Pool { .. } => DoubleSpendKind::Pool,
        }
    }

    pub fn tx_id(&self) -> TxId {
        match self {
            Self::Block { tx_id, .. } | Self::Pool { tx_id, .. } => *tx_id,
        }
    }

    pub fn conflicting_txid(&self) -> Hash {
        match self {
            Self::Block {
                conflicting_txid, ..
            }
            | Self::Pool {
                conflicting_txid, ..
            } => *conflicting_txid,
        }
    }

    pub fn block_id(&self) -> Option<BlockId> {
        match self {
            Self::Block { block_id, .. } => Some(*block_id),
            Self::Pool { .. } => None,
        }
    }
}

/// A (tracked transaction, block, conflicting transaction) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDoubleSpend {
    pub tx_id: TxId,
    pub block_id: BlockId,
    pub conflicting_txid: Hash,
    pub payload: Option<Vec<u8>>,
    pub notification_sent_at: Option<u64>,
}

impl BlockDoubleSpend {
    pub fn key(&self) -> DoubleSpendKey {
        DoubleSpendKey::Block {
            tx_id: self.tx_id,
            block_id: self.block_id,
            conflicting_txid: self.conflicting_txid,
        }
    }
}

/// A (tracked transaction, conflicting transaction) pool-level record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDoubleSpendAttempt {
    pub tx_id: TxId,
    pub conflicting_txid: Hash,
    pub payload: Option<Vec<u8>>,
    pub notification_sent_at: Option<u64>,
}

impl PoolDoubleSpendAttempt {
    pub fn key(&self) -> DoubleSpendKey {
        DoubleSpendKey::Pool {
            tx_id: self.tx_id,
            conflicting_txid: self.conflicting_txid,
        }
    }
}

/// A double-spend record of either kind, joined with its tracked transaction
/// and block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleSpendRecord {
    pub key: DoubleSpendKey,
    pub txid: Hash,
    /// `None` for pool-level attempts.
    pub block_hash: Option<Hash>,
    pub payload: Option<Vec<u8>>,
    pub callback: CallbackTarget,
    pub notification_sent_at: Option<u64>,
}

/// A tracked transaction whose input is spent by a different transaction in
/// a scanned block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictedSpend {
    pub txid: Hash,
    pub conflicting_txid: Hash,
}

/// Result of `scan_and_insert_block_double_spends`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockScanOutcome {
    /// `false` when the fork-root heuristic skipped the scan.
    pub scanned: bool,
    /// Every conflicted tracked transaction, whether or not it is watched.
    pub conflicted: Vec<ConflictedSpend>,
    /// Records inserted by this scan.
    pub inserted: Vec<BlockDoubleSpend>,
}

impl BlockScanOutcome {
    pub fn skipped() -> Self {
        Self::default()
    }
}
