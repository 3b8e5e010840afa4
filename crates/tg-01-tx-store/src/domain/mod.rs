//! # Domain Module
//!
//! Store rows and errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
