//! Input preprocessing.

use augury_core::Payload;
use serde::Deserialize;
use serde_json::Value;

use crate::{Processed, ProcessingError};

/// Recognized preprocessing options. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessConfig {
    /// Standardize numeric fields.
    #[serde(default)]
    pub normalize: bool,
    /// Mean used for standardization.
    #[serde(default)]
    pub mean: f64,
    /// Standard deviation used for standardization.
    #[serde(default = "default_std")]
    pub std: f64,
    /// Replace null fields.
    #[serde(default)]
    pub fill_na: bool,
    /// Replacement for null fields.
    #[serde(default = "default_fill_value")]
    pub fill_value: Value,
}

fn default_std() -> f64 {
    1.0
}

fn default_fill_value() -> Value {
    Value::from(0)
}

impl PreprocessConfig {
    /// Parses the options from a model's preprocessing config.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized option has the wrong type.
    pub fn from_payload(config: &Payload) -> Result<Self, ProcessingError> {
        Ok(serde_json::from_value(Value::Object(config.clone()))?)
    }
}

/// Applies the model's preprocessing config to an input payload.
///
/// Normalization runs before null filling, so filled values are never
/// standardized. On failure the original input is returned, flagged as degraded.
pub fn preprocess(input: &Payload, config: &Payload) -> Processed<Payload> {
    if config.is_empty() {
        return Processed::ok(input.clone());
    }

    match try_preprocess(input, config) {
        Ok(processed) => {
            tracing::debug!(fields = processed.len(), "Preprocessing applied");
            Processed::ok(processed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Preprocessing failed, using raw input");
            Processed::fallback(input.clone())
        }
    }
}

fn try_preprocess(input: &Payload, config: &Payload) -> Result<Payload, ProcessingError> {
    let config = PreprocessConfig::from_payload(config)?;
    let mut processed = input.clone();

    if config.normalize {
        if config.std == 0.0 {
            return Err(ProcessingError::ZeroStd);
        }
        for (key, value) in &mut processed {
            if let Value::Number(n) = value {
                let Some(x) = n.as_f64() else { continue };
                let scaled = (x - config.mean) / config.std;
                *value = serde_json::Number::from_f64(scaled)
                    .map(Value::Number)
                    .ok_or_else(|| ProcessingError::NonFinite(key.clone()))?;
            }
        }
    }

    if config.fill_na {
        for value in processed.values_mut() {
            if value.is_null() {
                *value = config.fill_value.clone();
            }
        }
    }

    Ok(processed)
}
