//! # Domain Module
//!
//! Reactor outcomes, notification snapshots and errors.

pub mod errors;
pub mod outcome;

pub use errors::*;
pub use outcome::*;
