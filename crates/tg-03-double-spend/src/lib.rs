//! # TG-03 Double-Spend Detection
//!
//! Decides which watched transactions lost their spent outputs to someone
//! else and announces each such finding once.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Detection Paths
//!
//! | Path | Trigger | Record |
//! |------|---------|--------|
//! | Block scan | block parsed while a recent height holds a fork | block-level |
//! | Pool conflict | node rejected a submission naming colliding txs | pool-level |
//! | Pool eviction | node evicted a pool tx for a block tx | block-level |
//!
//! Conflicts found on any transaction, watched or not, propagate to every
//! watched descendant spending its outputs.
//!
//! ## Module Structure
//!
//! ```text
//! tg-03-double-spend/
//! ├── domain/          # Outcomes, notification snapshots, DoubleSpendError
//! ├── ports/           # DoubleSpendApi (inbound)
//! ├── service/         # DoubleSpendDetector, NotificationReader
//! └── config.rs        # DoubleSpendConfig
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use config::DoubleSpendConfig;
pub use domain::{notification_from_record, DoubleSpendError, EvictionOutcome, PoolConflictOutcome};
pub use ports::DoubleSpendApi;
pub use service::{DoubleSpendDetector, NotificationReader};
