//! # Shared Types Crate
//!
//! Chain-facing value types and the remote chain gateway port used by every
//! subsystem of the block ingestion and double-spend engine.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: hashes, headers, block content and
//!   transaction inputs are defined once, here.
//! - **Store Agnostic**: nothing in this crate knows how blocks or tracked
//!   transactions are persisted.
//! - **Gateway as a Port**: `ChainGateway` is the only way the engine talks to
//!   nodes. Multi-node merge strategies live behind it.

pub mod entities;
pub mod errors;
pub mod gateway;
pub mod test_utils;

pub use entities::*;
pub use errors::*;
pub use gateway::{ChainGateway, InMemoryChainGateway};
