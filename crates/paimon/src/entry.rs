//! Resident model entries.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use augury_core::Payload;
use chrono::{DateTime, Utc};
use orobas::{Framework, Predictor};
use seere::LoadedModel;

/// A loaded model owned by the registry.
///
/// Entries are shared as `Arc<ModelEntry>`, so a model evicted while a
/// prediction is running stays alive until that prediction completes.
pub struct ModelEntry {
    /// Model identifier.
    pub model_id: String,
    /// The predictor.
    pub predictor: Arc<dyn Predictor>,
    /// Artifact version.
    pub version: String,
    /// Model framework.
    pub framework: Framework,
    /// Input field order, if fixed by the artifact.
    pub feature_order: Option<Vec<String>>,
    /// Preprocessing options.
    pub preprocessing: Payload,
    /// Postprocessing options.
    pub postprocessing: Payload,
    /// When the load completed.
    pub loaded_at: DateTime<Utc>,
    /// Time spent loading.
    pub load_duration: Duration,
    predictions: AtomicU64,
}

impl ModelEntry {
    /// Counts a prediction served by this entry.
    pub fn record_prediction(&self) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Predictions served by this entry since it was loaded.
    #[must_use]
    pub fn prediction_count(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    /// Whether the predictor reports class probabilities.
    #[must_use]
    pub fn is_probabilistic(&self) -> bool {
        self.predictor.as_probabilistic().is_some()
    }
}

impl From<LoadedModel> for ModelEntry {
    fn from(loaded: LoadedModel) -> Self {
        Self {
            model_id: loaded.model_id,
            predictor: loaded.predictor,
            version: loaded.version,
            framework: loaded.framework,
            feature_order: loaded.feature_order,
            preprocessing: loaded.preprocessing,
            postprocessing: loaded.postprocessing,
            loaded_at: Utc::now(),
            load_duration: loaded.load_duration,
            predictions: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("model_id", &self.model_id)
            .field("version", &self.version)
            .field("framework", &self.framework)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

impl Drop for ModelEntry {
    fn drop(&mut self) {
        tracing::debug!(model_id = %self.model_id, "Model released");
    }
}
