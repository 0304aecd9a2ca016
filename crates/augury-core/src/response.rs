//! Response types for prediction and admin operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ModelId, RequestId};

/// Result of a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Request identifier.
    pub request_id: RequestId,

    /// Model that produced the prediction.
    pub model_id: ModelId,

    /// Prediction value (scalar or structured).
    pub prediction: Value,

    /// Highest class probability, when requested and supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    /// Full class probability vector, when requested and supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,

    /// Processing time in milliseconds.
    pub processing_time_ms: f64,

    /// When the prediction was produced.
    pub timestamp: DateTime<Utc>,

    /// Provenance information.
    pub metadata: PredictionMetadata,
}

/// Provenance attached to every [`PredictionResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    /// Version of the model artifact.
    pub model_version: String,

    /// Whether the model carries a preprocessing configuration.
    pub preprocessing_applied: bool,

    /// Whether the result was served from the result cache.
    pub cache_used: bool,

    /// Whether the confidence fell below the configured threshold.
    #[serde(default)]
    pub low_confidence: bool,

    /// Whether preprocessing failed and the raw input was used instead.
    #[serde(default)]
    pub preprocessing_degraded: bool,

    /// Whether postprocessing failed and the raw output was returned instead.
    #[serde(default)]
    pub postprocessing_degraded: bool,
}

/// Result of a batch prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionResult {
    /// Model that produced the predictions.
    pub model_id: ModelId,

    /// Results in input order.
    pub predictions: Vec<PredictionResult>,

    /// Number of inputs.
    pub batch_size: usize,

    /// Wall-clock time for the whole batch in milliseconds.
    pub total_processing_time_ms: f64,

    /// Average time per input in milliseconds.
    pub average_processing_time_ms: f64,
}

/// Admin view of a resident model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub model_id: ModelId,

    /// Artifact version.
    pub version: String,

    /// Framework tag.
    pub framework: String,

    /// Whether the predictor can report class probabilities.
    pub probabilistic: bool,

    /// When the model was loaded.
    pub loaded_at: DateTime<Utc>,

    /// Load time in milliseconds.
    pub load_time_ms: f64,

    /// Last time the registry served this model.
    pub last_access: DateTime<Utc>,

    /// Seconds since the last access.
    pub idle_seconds: u64,

    /// Whether the idle time exceeds the configured TTL hint.
    pub past_ttl: bool,

    /// Predictions recorded for this model.
    pub prediction_count: u64,
}
