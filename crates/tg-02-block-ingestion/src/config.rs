//! # Ingestion Configuration

use serde::{Deserialize, Serialize};

/// Default depth below the best height past which a branch is not walked.
pub const DEFAULT_MAX_FORK_DEPTH: u64 = 288;

/// Block ingestion configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// A discovered block more than this many heights below the best height
    /// is neither inserted nor walked past.
    pub max_fork_depth: u64,

    /// Age after which a block with an unset parse marker is re-queued.
    pub unparsed_block_timeout_secs: u64,

    /// Interval between maintenance sweeps.
    pub maintenance_interval_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_fork_depth: DEFAULT_MAX_FORK_DEPTH,
            unparsed_block_timeout_secs: 300,
            maintenance_interval_secs: 60,
        }
    }
}

impl IngestionConfig {
    /// Create a config for testing (short depth, immediate re-queue).
    pub fn for_testing() -> Self {
        Self {
            max_fork_depth: 10,
            unparsed_block_timeout_secs: 0,
            maintenance_interval_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestionConfig::default();
        assert_eq!(config.max_fork_depth, 288);
        assert_eq!(config.unparsed_block_timeout_secs, 300);
        assert_eq!(config.maintenance_interval_secs, 60);
    }

    #[test]
    fn test_testing_config() {
        let config = IngestionConfig::for_testing();
        assert_eq!(config.max_fork_depth, 10);
        assert_eq!(config.unparsed_block_timeout_secs, 0);
    }

    #[test]
    fn test_missing_fields_default() {
        let config: IngestionConfig = serde_json::from_str(r#"{"max_fork_depth": 6}"#).unwrap();
        assert_eq!(config.max_fork_depth, 6);
        assert_eq!(config.maintenance_interval_secs, 60);
    }
}
