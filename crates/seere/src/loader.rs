//! Artifact loading.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use augury_core::{Error, Payload, Result};
use orobas::{Framework, Predictor};
use vassago::Timer;

use crate::artifact::ModelArtifact;
use crate::source::ArtifactSource;

/// A predictor ready to serve, with the configuration that came with it.
pub struct LoadedModel {
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
    /// Time spent fetching and decoding.
    pub load_duration: Duration,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_id", &self.model_id)
            .field("version", &self.version)
            .field("framework", &self.framework)
            .field("load_duration", &self.load_duration)
            .finish_non_exhaustive()
    }
}

/// Resolves model identifiers into loaded predictors.
#[derive(Clone)]
pub struct ArtifactLoader {
    source: Arc<dyn ArtifactSource>,
}

impl ArtifactLoader {
    /// Creates a loader over the given source.
    #[must_use]
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self { source }
    }

    /// Name of the underlying source.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetches, decodes and validates the artifact for `model_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArtifactUnavailable`] if the source has no artifact
    /// - [`Error::Deserialization`] if the artifact is malformed or inconsistent
    /// - any error raised by the source itself
    pub async fn load(&self, model_id: &str) -> Result<LoadedModel> {
        let timer = Timer::start("artifact_load");

        let bytes = self
            .source
            .fetch(model_id)
            .await?
            .ok_or_else(|| Error::ArtifactUnavailable {
                model_id: model_id.to_string(),
            })?;

        let artifact = ModelArtifact::from_slice(model_id, &bytes)?;
        let framework = artifact.model.framework();
        let predictor = artifact
            .model
            .into_predictor()
            .map_err(|e| Error::deserialization(model_id, e.to_string()))?;

        if let Some(order) = &artifact.feature_order {
            if order.len() != predictor.n_features() {
                return Err(Error::deserialization(
                    model_id,
                    format!(
                        "feature_order lists {} fields but the model takes {}",
                        order.len(),
                        predictor.n_features()
                    ),
                ));
            }
        }

        let load_duration = Duration::from_secs_f64(timer.stop() / 1000.0);

        tracing::info!(
            model_id,
            source = self.source.name(),
            framework = %framework,
            version = %artifact.version,
            load_ms = load_duration.as_secs_f64() * 1000.0,
            "Artifact loaded"
        );

        Ok(LoadedModel {
            model_id: model_id.to_string(),
            predictor,
            version: artifact.version,
            framework,
            feature_order: artifact.feature_order,
            preprocessing: artifact.preprocessing,
            postprocessing: artifact.postprocessing,
            load_duration,
        })
    }
}
