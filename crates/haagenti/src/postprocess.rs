//! Output postprocessing.

use augury_core::Payload;
use serde::Deserialize;
use serde_json::Value;

use crate::{Processed, ProcessingError};

/// Recognized postprocessing options. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostprocessConfig {
    /// Maps raw labels to display labels.
    #[serde(default)]
    pub class_mapping: Option<Payload>,
    /// Confidence below which a result is marked low confidence.
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

impl PostprocessConfig {
    /// Parses the options from a model's postprocessing config.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized option has the wrong type.
    pub fn from_payload(config: &Payload) -> Result<Self, ProcessingError> {
        Ok(serde_json::from_value(Value::Object(config.clone()))?)
    }
}

/// Applies the model's postprocessing config to a raw prediction payload.
///
/// The payload is expected to carry `prediction` and, when computed,
/// `confidence`. On failure the raw payload is returned, flagged as degraded.
pub fn postprocess(raw: &Payload, config: &Payload) -> Processed<Payload> {
    if config.is_empty() {
        return Processed::ok(raw.clone());
    }

    match try_postprocess(raw, config) {
        Ok(processed) => Processed::ok(processed),
        Err(e) => {
            tracing::warn!(error = %e, "Postprocessing failed, using raw output");
            Processed::fallback(raw.clone())
        }
    }
}

fn try_postprocess(raw: &Payload, config: &Payload) -> Result<Payload, ProcessingError> {
    let config = PostprocessConfig::from_payload(config)?;
    let mut processed = raw.clone();

    if let Some(mapping) = config.class_mapping.as_ref().filter(|m| !m.is_empty()) {
        if let Some(prediction) = processed.get_mut("prediction") {
            let mapped = label_keys(prediction)
                .into_iter()
                .find_map(|key| mapping.get(&key));
            if let Some(mapped) = mapped {
                *prediction = mapped.clone();
            }
        }
    }

    if let Some(threshold) = config.confidence_threshold {
        match processed.get("confidence") {
            Some(Value::Number(n)) => {
                let confidence = n.as_f64().ok_or_else(|| {
                    ProcessingError::Payload("confidence out of range".to_string())
                })?;
                if confidence < threshold {
                    processed.insert("low_confidence".to_string(), Value::Bool(true));
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => {
                return Err(ProcessingError::Payload(
                    "confidence is not numeric".to_string(),
                ))
            }
        }
    }

    Ok(processed)
}

/// Candidate mapping keys for a label, most specific first.
///
/// Integral floats also try their integer rendering, so `1.0` matches `"1"`.
#[allow(clippy::cast_possible_truncation)]
fn label_keys(label: &Value) -> Vec<String> {
    match label {
        Value::String(s) => vec![s.clone()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return vec![n.to_string()];
            }
            let mut keys = vec![n.to_string()];
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    keys.insert(0, (f as i64).to_string());
                }
            }
            keys
        }
        _ => Vec::new(),
    }
}
