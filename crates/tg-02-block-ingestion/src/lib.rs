//! # TG-02 Block Ingestion
//!
//! Reconstructs a locally consistent view of the chain from asynchronous
//! "new block" notifications that may arrive out of order, duplicated or
//! with gaps.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | At most one row per block | store insert keyed by hash |
//! | Ancestors parsed before descendants | per-walk LIFO stack, flushed oldest first |
//! | Bounded walk on deep forks | `max_fork_depth` below the best height |
//! | No concurrent parse of one block | in-flight hash set |
//! | Crash-safe parsing | per-phase markers + maintenance sweep |
//!
//! ## Module Structure
//!
//! ```text
//! tg-02-block-ingestion/
//! ├── domain/          # WalkStack, InFlightSet, outcomes, IngestionError
//! ├── ports/           # BlockIngestionApi (inbound), BlockConflictScanner (outbound)
//! ├── service/         # Coordinator, parser, maintenance sweep
//! └── config.rs        # IngestionConfig
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use config::IngestionConfig;
pub use domain::{
    IngestOutcome, IngestionError, ParseOutcome, ParseReport, ParserStatus, SweepOutcome, WalkStop,
};
pub use ports::{BlockConflictScanner, BlockIngestionApi, RecordingScanner};
pub use service::{BlockIngestionCoordinator, BlockParser, MaintenanceSweep};
