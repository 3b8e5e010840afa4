//! # Adapters Module
//!
//! Store implementations.

pub mod memory;
pub mod retry;

pub use memory::InMemoryTransactionStore;
pub use retry::RetryingStore;
