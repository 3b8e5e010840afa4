//! # Domain Module
//!
//! Walk ordering, parse dedup, outcomes and errors.

pub mod errors;
pub mod in_flight;
pub mod outcome;
pub mod walk;

pub use errors::*;
pub use in_flight::{InFlightGuard, InFlightSet};
pub use outcome::*;
pub use walk::{ParseTicket, WalkStack};
