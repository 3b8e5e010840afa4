//! # Double-Spend Configuration

use serde::{Deserialize, Serialize};

/// Default number of recent heights examined by the fork-root heuristic.
pub const DEFAULT_DELTA_BLOCK_HEIGHT: u64 = 144;

/// Double-spend detector configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleSpendConfig {
    /// A block scan runs only when one of this many most recent heights
    /// holds more than one block.
    pub delta_block_height_for_double_spend_check: u64,
}

impl Default for DoubleSpendConfig {
    fn default() -> Self {
        Self {
            delta_block_height_for_double_spend_check: DEFAULT_DELTA_BLOCK_HEIGHT,
        }
    }
}

impl DoubleSpendConfig {
    /// Create a config for testing (short window).
    pub fn for_testing() -> Self {
        Self {
            delta_block_height_for_double_spend_check: 6,
        }
    }
}
