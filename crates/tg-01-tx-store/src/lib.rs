//! # TG-01 Transaction Store
//!
//! Persistence for blocks, tracked transactions and double-spend records.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The store is the single shared mutable resource of the engine. Every
//! mutation it offers is an idempotent upsert or a uniqueness-guarded insert,
//! so concurrent or repeated delivery of the same signal never produces a
//! duplicate row:
//!
//! | Record | Uniqueness key |
//! |--------|----------------|
//! | Block | content hash |
//! | Block/transaction link | (transaction, block) |
//! | Block double spend | (transaction, block, conflicting txid) |
//! | Pool double-spend attempt | (transaction, conflicting txid) |
//!
//! ## Module Structure
//!
//! ```text
//! tg-01-tx-store/
//! ├── domain/          # Rows and StoreError
//! ├── algorithms/      # Spend-graph traversal, fork-root heuristic
//! ├── ports/           # TransactionStore trait
//! ├── adapters/        # In-memory store, retrying decorator
//! └── config.rs        # RetryConfig
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryTransactionStore, RetryingStore};
pub use algorithms::{fork_window, has_recent_fork, SpendGraph};
pub use config::RetryConfig;
pub use domain::{
    BlockDoubleSpend, BlockRecord, BlockScanOutcome, BlockTxLink, ConflictedSpend,
    DoubleSpendKey, DoubleSpendKind, DoubleSpendRecord, LinkedTransaction, MerkleProofRecord,
    NewBlock, NewTrackedTransaction, PoolDoubleSpendAttempt, StoreError, TrackedInput,
    TrackedTransaction,
};
pub use ports::TransactionStore;
