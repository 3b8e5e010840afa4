//! # Core Chain Entities
//!
//! Value types describing what the remote nodes report about blocks and
//! transactions. None of these carry store identity; see `tg-01-tx-store` for
//! the persisted rows.

use serde::{Deserialize, Serialize};

/// A 32-byte block or transaction hash.
pub type Hash = [u8; 32];

/// Previous-block hash of the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Short hex prefix of a hash for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Store-assigned surrogate key of a block row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Store-assigned surrogate key of a tracked transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Callback delivery metadata. Opaque to the engine; carried into notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackTarget {
    pub url: Option<String>,
    pub token: Option<String>,
    pub encryption: Option<String>,
}

/// Block header as reported by the chain gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Content hash of the block.
    pub hash: Hash,
    /// Height in the reporting node's chain.
    pub height: u64,
    /// Previous-block hash. `None` only for genesis.
    pub prev_hash: Option<Hash>,
    /// Block timestamp (seconds since epoch).
    pub timestamp: u64,
}

impl BlockHeader {
    /// Previous-block hash, defaulting to [`ZERO_HASH`] for genesis.
    pub fn prev_hash_or_zero(&self) -> Hash {
        self.prev_hash.unwrap_or(ZERO_HASH)
    }
}

/// Reference to a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Id of the transaction that created the output.
    pub txid: Hash,
    /// Output index within that transaction.
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// A transaction inside block content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    /// External id (content hash).
    pub txid: Hash,
    /// Spent outputs, in input order.
    pub inputs: Vec<OutPoint>,
    /// Raw serialized transaction.
    pub raw: Vec<u8>,
}

/// One input of one block transaction, flattened for batch comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputTriple {
    /// External id of the spending transaction.
    pub txid: Hash,
    /// Id of the transaction whose output is spent.
    pub prev_txid: Hash,
    /// Index of the spent output.
    pub prev_vout: u32,
}

impl InputTriple {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_txid, self.prev_vout)
    }
}

/// Full block content: header plus ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    pub header: BlockHeader,
    pub transactions: Vec<ChainTransaction>,
}

impl BlockContent {
    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    /// External ids of all transactions, in block order.
    pub fn txids(&self) -> Vec<Hash> {
        self.transactions.iter().map(|tx| tx.txid).collect()
    }

    /// Look up a transaction by external id.
    pub fn transaction(&self, txid: &Hash) -> Option<&ChainTransaction> {
        self.transactions.iter().find(|tx| &tx.txid == txid)
    }

    /// Flatten every input of every transaction into `(txid, prev_txid, prev_vout)`.
    pub fn input_triples(&self) -> Vec<InputTriple> {
        self.transactions
            .iter()
            .flat_map(|tx| {
                tx.inputs.iter().map(move |input| InputTriple {
                    txid: tx.txid,
                    prev_txid: input.txid,
                    prev_vout: input.vout,
                })
            })
            .collect()
    }
}
