//! # Algorithms Module
//!
//! Store-independent graph and chain-shape queries. Every store adapter
//! answers its recursive queries through these.

pub mod fork_root;
pub mod spend_graph;

pub use fork_root::{fork_window, has_recent_fork};
pub use spend_graph::SpendGraph;
