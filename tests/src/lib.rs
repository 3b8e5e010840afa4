//! # Transaction Gateway Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── harness.rs        # Engine wired without workers, pumped by hand
//! │   └── integration/      # Ingestion and double-spend scenarios
//! └── benches/              # Criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tg-tests
//! cargo test -p tg-tests integration::double_spend_flows
//! cargo bench -p tg-tests
//! ```

pub mod harness;
pub mod integration;
