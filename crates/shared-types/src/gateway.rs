//! # Remote Chain Gateway Port
//!
//! The engine's only view of the blockchain nodes. Implementations hide how
//! many nodes sit behind them and how their answers are merged; timeouts are
//! the implementation's responsibility.

use crate::entities::{BlockContent, BlockHeader, Hash};
use crate::errors::GatewayError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Outbound port to the remote nodes.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Fetch a block header by hash.
    async fn block_header(&self, hash: &Hash) -> Result<BlockHeader, GatewayError>;

    /// Fetch full block content (ordered transactions with inputs).
    async fn block_content(&self, hash: &Hash) -> Result<BlockContent, GatewayError>;

    /// Height of the best chain tip across the nodes.
    async fn best_block_height(&self) -> Result<u64, GatewayError>;
}

#[derive(Default)]
struct ChainState {
    blocks: HashMap<Hash, BlockContent>,
    best_height: Option<u64>,
    unavailable: HashSet<Hash>,
    malformed: HashSet<Hash>,
}

/// Scriptable in-memory gateway.
///
/// Used by tests and by the runtime's standalone mode. Blocks are added with
/// [`InMemoryChainGateway::add_block`]; individual hashes can be made to fail
/// as unreachable or malformed.
#[derive(Default)]
pub struct InMemoryChainGateway {
    state: RwLock<ChainState>,
    header_requests: AtomicU64,
    content_requests: AtomicU64,
}

impl InMemoryChainGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a block known to the "nodes".
    pub fn add_block(&self, block: BlockContent) {
        let mut state = self.state.write();
        state.blocks.insert(block.hash(), block);
    }

    /// Pin the reported best height. Without a pin the highest known block wins.
    pub fn set_best_height(&self, height: u64) {
        self.state.write().best_height = Some(height);
    }

    /// Requests for this hash fail with [`GatewayError::Unavailable`].
    pub fn make_unavailable(&self, hash: Hash) {
        self.state.write().unavailable.insert(hash);
    }

    /// Undo [`InMemoryChainGateway::make_unavailable`].
    pub fn make_available(&self, hash: &Hash) {
        self.state.write().unavailable.remove(hash);
    }

    /// Content requests for this hash fail with [`GatewayError::MalformedPayload`].
    pub fn make_malformed(&self, hash: Hash) {
        self.state.write().malformed.insert(hash);
    }

    pub fn header_requests(&self) -> u64 {
        self.header_requests.load(Ordering::Relaxed)
    }

    pub fn content_requests(&self) -> u64 {
        self.content_requests.load(Ordering::Relaxed)
    }

    fn check_available(state: &ChainState, hash: &Hash) -> Result<(), GatewayError> {
        if state.unavailable.contains(hash) {
            return Err(GatewayError::Unavailable(format!(
                "no node answered for {}",
                hex::encode(hash)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainGateway for InMemoryChainGateway {
    async fn block_header(&self, hash: &Hash) -> Result<BlockHeader, GatewayError> {
        self.header_requests.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();
        Self::check_available(&state, hash)?;
        state
            .blocks
            .get(hash)
            .map(|block| block.header.clone())
            .ok_or(GatewayError::NotFound(*hash))
    }

    async fn block_content(&self, hash: &Hash) -> Result<BlockContent, GatewayError> {
        self.content_requests.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read();
        Self::check_available(&state, hash)?;
        if state.malformed.contains(hash) {
            return Err(GatewayError::MalformedPayload {
                hash: *hash,
                reason: "transaction bytes do not parse".to_string(),
            });
        }
        state
            .blocks
            .get(hash)
            .cloned()
            .ok_or(GatewayError::NotFound(*hash))
    }

    async fn best_block_height(&self) -> Result<u64, GatewayError> {
        let state = self.state.read();
        if let Some(height) = state.best_height {
            return Ok(height);
        }
        state
            .blocks
            .values()
            .map(|block| block.header.height)
            .max()
            .ok_or_else(|| GatewayError::Unavailable("no blocks known".to_string()))
    }
}
