//! # Vassago
//!
//! *"The Prince declares things past and to come"*
//!
//! Vassago provides observability for the Augury service: per-model and
//! global prediction metrics, structured logging, and lightweight timers.
//!
//! ## Features
//!
//! - **Prediction Metrics**: latency samples, success rates, cache hit rates
//! - **Bounded Cardinality**: per-model stats are capped and forgotten on eviction
//! - **Structured Logging**: pretty or JSON-formatted logs via `tracing`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{
    GlobalStatsSnapshot, MetricsCollector, MetricsSnapshot, ModelStatsSnapshot, Timer,
};

/// Configuration for logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line.
    pub service_name: String,
    /// Log level, overridden by `RUST_LOG` when set.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("augury")
    }
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Sets the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enables JSON logging.
    #[must_use]
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfig::new("augury-test")
            .with_log_level("debug")
            .with_json_logs(true);

        assert_eq!(config.service_name, "augury-test");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }
}
