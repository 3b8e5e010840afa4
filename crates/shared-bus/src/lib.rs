//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Carries node signals into the engine and notifications out of it.
//!
//! ```text
//! ┌────────────────┐  NewBlockDiscovered   ┌──────────────────┐
//! │ node plumbing  │ ────────────────────▶ │ block ingestion  │
//! └────────────────┘                       └──────────────────┘
//!         │ PoolConflict / PoolEvicted              │ BlockAvailableForParsing
//!         ▼                                         ▼
//! ┌────────────────┐                       ┌──────────────────┐
//! │ double spend   │ ◀──── scan_block ──── │ block parser     │
//! └────────────────┘                       └──────────────────┘
//!         │ DoubleSpendDetected                     │ MerkleProofReady
//!         └──────────────▶ callback dispatcher ◀────┘
//! ```
//!
//! ## Delivery
//!
//! - Each subscription owns a bounded channel; events arrive in publication
//!   order.
//! - A full channel makes the publisher wait. Nothing is dropped while a
//!   matching subscriber is alive.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{
    DoubleSpendNotification, EventFilter, EventTopic, GatewayEvent, MerkleProofNotification,
    PoolConflictSignal, PoolEvictionSignal, RejectCode,
};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
