//! # Gateway Runtime Library
//!
//! Exposes the runtime internals for testing. The entry point is the
//! `main.rs` binary.
//!
//! ## Structure
//!
//! - `config` - `EngineConfig` loading (JSON file + environment overrides)
//! - `handlers` - one worker per inbound signal type, plus the maintenance timer
//! - `runtime` - `EngineRuntime`: wiring, startup and cooperative shutdown

#![allow(clippy::type_complexity)]

pub mod config;
pub mod handlers;
pub mod runtime;

pub use config::{BusConfig, ConfigError, EngineConfig};
pub use runtime::EngineRuntime;
