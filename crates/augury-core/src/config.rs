//! Service configuration.
//!
//! The struct is plain serde so that the binary can layer it from defaults,
//! a TOML file and `AUGURY_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the prediction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Maximum number of resident models.
    #[serde(default = "default_max_models")]
    pub max_models_in_memory: usize,

    /// Idle time after which a resident model is reported as stale.
    ///
    /// Advisory only: the registry evicts by LRU, never by age.
    #[serde(default = "default_model_cache_ttl")]
    pub model_cache_ttl_secs: u64,

    /// Maximum number of inputs in a batch request.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Inference deadline per request.
    #[serde(default = "default_prediction_timeout")]
    pub prediction_timeout_secs: u64,

    /// Lifetime of cached prediction results.
    #[serde(default = "default_result_cache_ttl")]
    pub result_cache_ttl_secs: u64,

    /// Directory holding model artifacts.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Synthesize a demo model for identifiers with no artifact.
    #[serde(default)]
    pub demo_fallback: bool,

    /// Models to load at startup.
    #[serde(default)]
    pub preload_models: Vec<String>,

    /// Maximum number of models with tracked statistics.
    #[serde(default = "default_max_tracked_models")]
    pub max_tracked_models: usize,
}

fn default_max_models() -> usize {
    10
}

fn default_model_cache_ttl() -> u64 {
    3600
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_prediction_timeout() -> u64 {
    30
}

fn default_result_cache_ttl() -> u64 {
    300
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_max_tracked_models() -> usize {
    1000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_models_in_memory: default_max_models(),
            model_cache_ttl_secs: default_model_cache_ttl(),
            max_batch_size: default_max_batch_size(),
            prediction_timeout_secs: default_prediction_timeout(),
            result_cache_ttl_secs: default_result_cache_ttl(),
            model_dir: default_model_dir(),
            demo_fallback: false,
            preload_models: Vec::new(),
            max_tracked_models: default_max_tracked_models(),
        }
    }
}

impl ServiceConfig {
    /// Creates a new config builder.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the model TTL hint.
    #[must_use]
    pub fn model_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.model_cache_ttl_secs)
    }

    /// Returns the inference deadline.
    #[must_use]
    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_secs(self.prediction_timeout_secs)
    }

    /// Returns the result cache lifetime.
    #[must_use]
    pub fn result_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.result_cache_ttl_secs)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero capacities or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.max_models_in_memory == 0 {
            return Err(Error::InvalidConfig {
                message: "max_models_in_memory must be at least 1".to_string(),
            });
        }
        if self.max_batch_size == 0 {
            return Err(Error::InvalidConfig {
                message: "max_batch_size must be at least 1".to_string(),
            });
        }
        if self.prediction_timeout_secs == 0 {
            return Err(Error::InvalidConfig {
                message: "prediction_timeout_secs must be at least 1".to_string(),
            });
        }
        if self.max_tracked_models == 0 {
            return Err(Error::InvalidConfig {
                message: "max_tracked_models must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    max_models_in_memory: Option<usize>,
    model_cache_ttl_secs: Option<u64>,
    max_batch_size: Option<usize>,
    prediction_timeout_secs: Option<u64>,
    result_cache_ttl_secs: Option<u64>,
    model_dir: Option<PathBuf>,
    demo_fallback: Option<bool>,
    preload_models: Vec<String>,
    max_tracked_models: Option<usize>,
}

impl ServiceConfigBuilder {
    /// Sets the resident model limit.
    #[must_use]
    pub fn max_models_in_memory(mut self, max: usize) -> Self {
        self.max_models_in_memory = Some(max);
        self
    }

    /// Sets the model TTL hint in seconds.
    #[must_use]
    pub fn model_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.model_cache_ttl_secs = Some(secs);
        self
    }

    /// Sets the maximum batch size.
    #[must_use]
    pub fn max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = Some(max);
        self
    }

    /// Sets the inference deadline in seconds.
    #[must_use]
    pub fn prediction_timeout_secs(mut self, secs: u64) -> Self {
        self.prediction_timeout_secs = Some(secs);
        self
    }

    /// Sets the result cache lifetime in seconds.
    #[must_use]
    pub fn result_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.result_cache_ttl_secs = Some(secs);
        self
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Enables the demo model fallback.
    #[must_use]
    pub fn demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = Some(enabled);
        self
    }

    /// Adds a model to preload at startup.
    #[must_use]
    pub fn preload(mut self, model_id: impl Into<String>) -> Self {
        self.preload_models.push(model_id.into());
        self
    }

    /// Sets the per-model statistics cap.
    #[must_use]
    pub fn max_tracked_models(mut self, max: usize) -> Self {
        self.max_tracked_models = Some(max);
        self
    }

    /// Builds the config.
    #[must_use]
    pub fn build(self) -> ServiceConfig {
        ServiceConfig {
            max_models_in_memory: self.max_models_in_memory.unwrap_or_else(default_max_models),
            model_cache_ttl_secs: self
                .model_cache_ttl_secs
                .unwrap_or_else(default_model_cache_ttl),
            max_batch_size: self.max_batch_size.unwrap_or_else(default_max_batch_size),
            prediction_timeout_secs: self
                .prediction_timeout_secs
                .unwrap_or_else(default_prediction_timeout),
            result_cache_ttl_secs: self
                .result_cache_ttl_secs
                .unwrap_or_else(default_result_cache_ttl),
            model_dir: self.model_dir.unwrap_or_else(default_model_dir),
            demo_fallback: self.demo_fallback.unwrap_or(false),
            preload_models: self.preload_models,
            max_tracked_models: self
                .max_tracked_models
                .unwrap_or_else(default_max_tracked_models),
        }
    }
}
