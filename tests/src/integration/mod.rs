//! # Integration Tests
//!
//! - `ingestion_flows`: discovery, backfill, fork-depth bound, recovery
//! - `double_spend_flows`: block scan, pool signals, propagation, gating
//! - `runtime_flows`: the same signals through the running worker set

pub mod double_spend_flows;
pub mod ingestion_flows;
pub mod runtime_flows;
