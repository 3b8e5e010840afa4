//! # Service Module
//!
//! Coordinator, parser and maintenance sweep.

pub mod coordinator;
pub mod maintenance;
pub mod parser;


pub use coordinator::BlockIngestionCoordinator;
pub use maintenance::MaintenanceSweep;
pub use parser::BlockParser;
