// packages/privacy-mapper/src/observability/mod.rs
//! Logging and metrics setup
//!
//! Logs go to stderr so stdout stays reserved for interception outcomes.
//! Metrics are only exported when enabled; recording without an installed
//! recorder is a no-op.

use crate::utils::config::{LoggingConfig, MetricsConfig};
use crate::utils::errors::{MapperError, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Intercepted events, labelled by phase and outcome
pub const INTERCEPTS_TOTAL: &str = "privacy_mapper_intercepts_total";

/// Rejected events, labelled by error kind
pub const REJECTIONS_TOTAL: &str = "privacy_mapper_rejections_total";

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            MapperError::ConfigError(format!("invalid log level {}: {}", config.level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| MapperError::ConfigError(format!("Failed to init tracing: {}", e)))
}

/// Install the Prometheus exporter if enabled
pub fn init_metrics(config: &MetricsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MapperError::ConfigError(format!("Failed to install metrics exporter: {}", e)))?;

    describe_counter!(INTERCEPTS_TOTAL, "Intercepted events by phase and outcome");
    describe_counter!(REJECTIONS_TOTAL, "Rejected events by error kind");

    info!("Metrics exporter listening on {}", config.listen_addr);
    Ok(())
}

pub fn record_intercept(phase: &'static str, outcome: &'static str) {
    counter!(INTERCEPTS_TOTAL, "phase" => phase, "outcome" => outcome).increment(1);
}

pub fn record_rejection(kind: &'static str) {
    counter!(REJECTIONS_TOTAL, "kind" => kind).increment(1);
}
