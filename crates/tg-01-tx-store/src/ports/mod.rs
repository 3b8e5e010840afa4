//! # Ports Module
//!
//! The store port every engine subsystem depends on.

pub mod store;

pub use store::*;
