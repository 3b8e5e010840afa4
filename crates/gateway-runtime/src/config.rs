//! # Engine Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Loading order: defaults, then the JSON file named by `GW_CONFIG` (any
//! section or field may be omitted), then individual environment overrides.

use gateway_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::path::PathBuf;
use thiserror::Error;
use tg_01_tx_store::RetryConfig;
use tg_02_block_ingestion::IngestionConfig;
use tg_03_double_spend::DoubleSpendConfig;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_VAR: &str = "GW_CONFIG";

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ingestion: IngestionConfig,
    pub double_spend: DoubleSpendConfig,
    /// Store retry policy.
    pub retry: RetryConfig,
    pub bus: BusConfig,
    pub telemetry: TelemetryConfig,
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bounded capacity of each subscriber channel.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl EngineConfig {
    /// Load from `GW_CONFIG` (if set) and the environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.telemetry.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply numeric overrides. `lookup` maps a variable name to its value.
    ///
    /// # Variables
    ///
    /// - `GW_MAX_FORK_DEPTH`
    /// - `GW_DS_DELTA_HEIGHT`
    /// - `GW_UNPARSED_TIMEOUT_SECS`
    /// - `GW_MAINTENANCE_INTERVAL_SECS`
    /// - `GW_CHANNEL_CAPACITY`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "GW_MAX_FORK_DEPTH")? {
            self.ingestion.max_fork_depth = v;
        }
        if let Some(v) = parse_var(&lookup, "GW_DS_DELTA_HEIGHT")? {
            self.double_spend.delta_block_height_for_double_spend_check = v;
        }
        if let Some(v) = parse_var(&lookup, "GW_UNPARSED_TIMEOUT_SECS")? {
            self.ingestion.unparsed_block_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "GW_MAINTENANCE_INTERVAL_SECS")? {
            self.ingestion.maintenance_interval_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "GW_CHANNEL_CAPACITY")? {
            self.bus.channel_capacity = v;
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingestion.max_fork_depth == 0 {
            return Err(ConfigError::Invalid("max_fork_depth must be positive".into()));
        }
        if self.double_spend.delta_block_height_for_double_spend_check == 0 {
            return Err(ConfigError::Invalid(
                "delta_block_height_for_double_spend_check must be positive".into(),
            ));
        }
        if self.bus.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be positive".into()));
        }
        if self.ingestion.maintenance_interval_secs == 0 {
            return Err(ConfigError::Invalid("maintenance_interval_secs must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be positive".into()));
        }
        Ok(())
    }

    /// Short intervals and windows for tests.
    pub fn for_testing() -> Self {
        Self {
            ingestion: IngestionConfig::for_testing(),
            double_spend: DoubleSpendConfig::for_testing(),
            retry: RetryConfig::for_testing(),
            bus: BusConfig::default(),
            telemetry: TelemetryConfig::for_testing(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidOverride { var, value }),
    }
}
