// packages/privacy-mapper/src/utils/config.rs
//! Process configuration
//!
//! Loaded from an optional `privacy-mapper.toml` and `PRIVACY_MAPPER__*`
//! environment overrides. Fuzz parameters are process-wide constants (see
//! `rewrite::fuzz`) and not configurable.

use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default configuration file name (extension resolved by the loader)
pub const DEFAULT_CONFIG_FILE: &str = "privacy-mapper";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PRIVACY_MAPPER";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub randomness: RandomnessConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "privacy_mapper=trace"
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter
    pub enabled: bool,

    /// Exporter listen address
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9464)),
        }
    }
}

/// Randomness configuration
///
/// Without a seed the OS entropy source is used. A seed switches to the
/// deterministic generator and must only be set for tests and replays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomnessConfig {
    pub seed: Option<u64>,
}

impl MapperConfig {
    /// Load configuration from the default file name and the environment
    pub fn load() -> Result<Self> {
        Self::build(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Load configuration from an explicit file and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
