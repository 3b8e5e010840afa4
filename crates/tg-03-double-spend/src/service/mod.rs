//! # Service Layer

pub mod detector;
pub mod reader;

#[cfg(test)]
mod racing_store;

pub use detector::DoubleSpendDetector;
pub use reader::NotificationReader;
