//! The prediction service.

use std::sync::Arc;
use std::time::Duration;

use augury_core::{
    BatchPredictionRequest, BatchPredictionResult, Error, ModelId, ModelInfo, Payload,
    PredictionMetadata, PredictionRequest, PredictionResult, RequestId, Result, ServiceConfig,
};
use chrono::Utc;
use orobas::{Executor, RawPrediction};
use seere::{ArtifactLoader, ArtifactSource, DemoSource, FallbackSource, FilesystemSource};
use serde::Serialize;
use serde_json::Value;
use vassago::{MetricsCollector, MetricsSnapshot, Timer};

use crate::cache::{cache_key, MemoryResultCache, ResultCache};
use crate::entry::ModelEntry;
use crate::registry::ModelRegistry;

/// Liveness report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Always `"healthy"` while the service answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Number of resident models.
    pub loaded_models: usize,
    /// Seconds since the service started.
    pub uptime_seconds: f64,
}

/// Serves predictions from a bounded set of resident models.
pub struct PredictionService {
    config: ServiceConfig,
    registry: ModelRegistry,
    metrics: Arc<MetricsCollector>,
    result_cache: Arc<dyn ResultCache>,
}

impl PredictionService {
    /// Creates a service over an explicit loader and result cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is unusable.
    pub fn new(
        config: ServiceConfig,
        loader: ArtifactLoader,
        result_cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(MetricsCollector::new(config.max_tracked_models));
        let registry = ModelRegistry::new(
            loader,
            Arc::clone(&metrics),
            config.max_models_in_memory,
        )
        .with_result_cache(Arc::clone(&result_cache));

        tracing::info!(
            max_models = config.max_models_in_memory,
            timeout_secs = config.prediction_timeout_secs,
            "Prediction service created"
        );

        Ok(Self {
            config,
            registry,
            metrics,
            result_cache,
        })
    }

    /// Creates a service reading artifacts from `config.model_dir`, with the
    /// demo model as fallback when `config.demo_fallback` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is unusable.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let filesystem: Arc<dyn ArtifactSource> =
            Arc::new(FilesystemSource::new(config.model_dir.clone()));
        let source: Arc<dyn ArtifactSource> = if config.demo_fallback {
            Arc::new(FallbackSource::new(filesystem, Arc::new(DemoSource)))
        } else {
            filesystem
        };

        Self::new(
            config,
            ArtifactLoader::new(source),
            Arc::new(MemoryResultCache::new()),
        )
    }

    /// Loads the configured preload models. Failures are logged and skipped.
    ///
    /// Returns the number of models loaded.
    pub async fn startup(&self) -> usize {
        let mut loaded = 0;
        for model_id in &self.config.preload_models {
            match self.registry.get_or_load(model_id).await {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!(model_id = %model_id, error = %e, "Preload failed"),
            }
        }
        tracing::info!(
            loaded,
            requested = self.config.preload_models.len(),
            "Startup complete"
        );
        loaded
    }

    /// Releases every resident model.
    pub async fn shutdown(&self) {
        let released = self.registry.clear().await;
        tracing::info!(released, "Prediction service shut down");
    }

    /// Runs one prediction.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for an empty input
    /// - [`Error::ModelNotFound`] if the model has no artifact
    /// - [`Error::Inference`] or [`Error::Timeout`] if inference fails
    pub async fn predict(
        &self,
        model_id: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionResult> {
        request.validate()?;
        let timer = Timer::start("predict");

        let key = request
            .use_cache
            .then(|| cache_key(model_id, &request.input_data, request.return_probabilities));

        if let Some(key) = &key {
            if let Some(mut cached) = self.result_cache.get(key).await {
                let elapsed = timer.stop();
                self.metrics.record_result_cache_hit();
                self.metrics.record_prediction(model_id, elapsed, true);
                cached.request_id = RequestId::new();
                cached.processing_time_ms = elapsed;
                cached.timestamp = Utc::now();
                cached.metadata.cache_used = true;
                tracing::debug!(model_id, "Served from result cache");
                return Ok(cached);
            }
        }

        let outcome = match self.registry.get_or_load(model_id).await {
            Ok(entry) => self
                .run_entry(&entry, &request.input_data, request.return_probabilities)
                .await
                .map(|result| (entry, result)),
            Err(e) => Err(e),
        };
        let elapsed = timer.stop();
        self.metrics
            .record_prediction(model_id, elapsed, outcome.is_ok());

        match outcome {
            Ok((entry, mut result)) => {
                result.processing_time_ms = elapsed;
                if let Some(key) = &key {
                    self.cache_result(key, &entry, &result).await;
                }
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(model_id, error = %e, "Prediction failed");
                Err(e)
            }
        }
    }

    /// Runs a batch of predictions against one model.
    ///
    /// The batch fails as a whole if any item fails.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict), plus [`Error::InvalidRequest`]
    /// for an empty or oversized batch.
    #[allow(clippy::cast_precision_loss)]
    pub async fn predict_batch(
        &self,
        model_id: &str,
        request: &BatchPredictionRequest,
    ) -> Result<BatchPredictionResult> {
        request.validate(self.config.max_batch_size)?;
        let timer = Timer::start("predict_batch");

        let outcome = self.run_batch(model_id, request).await;
        let total = timer.stop();
        self.metrics
            .record_batch(model_id, request.len(), total, outcome.is_ok());

        let predictions = outcome.map_err(|e| {
            tracing::warn!(model_id, batch_size = request.len(), error = %e, "Batch prediction failed");
            e
        })?;

        let batch_size = predictions.len();
        tracing::info!(model_id, batch_size, total_ms = total, "Batch prediction complete");

        Ok(BatchPredictionResult {
            model_id: ModelId::from(model_id),
            batch_size,
            total_processing_time_ms: total,
            average_processing_time_ms: total / batch_size as f64,
            predictions,
        })
    }

    /// Resident model identifiers, most recently used first.
    #[must_use]
    pub fn loaded_models(&self) -> Vec<String> {
        self.registry.list_ids()
    }

    /// Number of resident models.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.registry.count()
    }

    /// Describes a resident model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if the model is not resident.
    pub fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let not_found = || Error::ModelNotFound {
            model_id: model_id.to_string(),
        };
        let entry = self.registry.peek(model_id).ok_or_else(not_found)?;
        let last_access = self.registry.last_access(model_id).ok_or_else(not_found)?;
        Ok(self.describe(&entry, last_access))
    }

    /// Unloads a model and drops its cached results. Returns whether it was
    /// resident.
    pub async fn unload(&self, model_id: &str) -> bool {
        self.registry.evict(model_id).await
    }

    /// Reloads a model from its artifact. Results cached from the previous
    /// copy are dropped.
    ///
    /// # Errors
    ///
    /// Returns the load error; the previous copy stays resident on failure.
    pub async fn reload(&self, model_id: &str) -> Result<ModelInfo> {
        let entry = self.registry.force_reload(model_id).await?;
        let last_access = self.registry.last_access(model_id).unwrap_or_else(Utc::now);
        tracing::info!(model_id, version = %entry.version, "Model reloaded");
        Ok(self.describe(&entry, last_access))
    }

    /// Global and per-model metrics.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Liveness report.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            loaded_models: self.registry.count(),
            uptime_seconds: self.metrics.global_snapshot().uptime_seconds,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    fn describe(&self, entry: &ModelEntry, last_access: chrono::DateTime<Utc>) -> ModelInfo {
        let idle = Utc::now()
            .signed_duration_since(last_access)
            .to_std()
            .unwrap_or_default();

        ModelInfo {
            model_id: ModelId::from(entry.model_id.as_str()),
            version: entry.version.clone(),
            framework: entry.framework.to_string(),
            probabilistic: entry.is_probabilistic(),
            loaded_at: entry.loaded_at,
            load_time_ms: entry.load_duration.as_secs_f64() * 1000.0,
            last_access,
            idle_seconds: idle.as_secs(),
            past_ttl: idle > self.config.model_cache_ttl(),
            prediction_count: entry.prediction_count(),
        }
    }

    async fn run_batch(
        &self,
        model_id: &str,
        request: &BatchPredictionRequest,
    ) -> Result<Vec<PredictionResult>> {
        let entry = self.registry.get_or_load(model_id).await?;
        let mut predictions = Vec::with_capacity(request.len());

        for input in &request.inputs {
            let timer = Timer::start("batch_item");
            let key = request
                .use_cache
                .then(|| cache_key(model_id, input, request.return_probabilities));

            if let Some(key) = &key {
                if let Some(mut cached) = self.result_cache.get(key).await {
                    self.metrics.record_result_cache_hit();
                    cached.request_id = RequestId::new();
                    cached.processing_time_ms = timer.elapsed_ms();
                    cached.timestamp = Utc::now();
                    cached.metadata.cache_used = true;
                    predictions.push(cached);
                    continue;
                }
            }

            let mut result = self
                .run_entry(&entry, input, request.return_probabilities)
                .await?;
            result.processing_time_ms = timer.elapsed_ms();
            if let Some(key) = &key {
                self.cache_result(key, &entry, &result).await;
            }
            predictions.push(result);
        }

        Ok(predictions)
    }

    /// Stores a result unless its model was replaced or evicted meanwhile.
    async fn cache_result(&self, key: &str, entry: &Arc<ModelEntry>, result: &PredictionResult) {
        if self.registry.is_current(entry) {
            self.result_cache
                .put(key, result, self.config.result_cache_ttl())
                .await;
        }
    }

    async fn run_entry(
        &self,
        entry: &Arc<ModelEntry>,
        input: &Payload,
        want_confidence: bool,
    ) -> Result<PredictionResult> {
        let pre = haagenti::preprocess(input, &entry.preprocessing);
        let raw = infer(
            Arc::clone(entry),
            pre.value,
            want_confidence,
            self.config.prediction_timeout(),
        )
        .await?;
        let post = haagenti::postprocess(&raw.into_payload(), &entry.postprocessing);
        entry.record_prediction();

        let output = post.value;
        Ok(PredictionResult {
            request_id: RequestId::new(),
            model_id: ModelId::from(entry.model_id.as_str()),
            prediction: output.get("prediction").cloned().unwrap_or(Value::Null),
            confidence_score: output.get("confidence").and_then(Value::as_f64),
            probabilities: output
                .get("probabilities")
                .and_then(|p| serde_json::from_value(p.clone()).ok()),
            processing_time_ms: 0.0,
            timestamp: Utc::now(),
            metadata: PredictionMetadata {
                model_version: entry.version.clone(),
                preprocessing_applied: !entry.preprocessing.is_empty(),
                cache_used: false,
                low_confidence: output
                    .get("low_confidence")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                preprocessing_degraded: pre.degraded,
                postprocessing_degraded: post.degraded,
            },
        })
    }
}

/// Runs the predictor off the async workers under the inference deadline.
///
/// On expiry the blocking task is detached, not cancelled.
async fn infer(
    entry: Arc<ModelEntry>,
    input: Payload,
    want_confidence: bool,
    deadline: Duration,
) -> Result<RawPrediction> {
    let model_id = entry.model_id.clone();

    let task = tokio::task::spawn_blocking(move || {
        Executor::run(
            &entry.model_id,
            entry.predictor.as_ref(),
            &input,
            entry.feature_order.as_deref(),
            want_confidence,
        )
    });

    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::inference(
            model_id,
            format!("inference task failed: {join_error}"),
        )),
        Err(_) => {
            tracing::warn!(model_id = %model_id, ?deadline, "Inference deadline exceeded");
            Err(Error::Timeout { duration: deadline })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{loader, payload, CountingSource};
    use serde_json::json;

    fn service(ids: &[&str], config: ServiceConfig) -> (PredictionService, Arc<CountingSource>) {
        let source = CountingSource::with_demo_models(ids, Duration::ZERO);
        let service =
            PredictionService::new(config, loader(&source), Arc::new(MemoryResultCache::new()))
                .unwrap();
        (service, source)
    }

    fn features(values: [f64; 4]) -> Payload {
        payload(json!({
            "feature_1": values[0],
            "feature_2": values[1],
            "feature_3": values[2],
            "feature_4": values[3],
        }))
    }

    #[tokio::test]
    async fn test_predict_maps_labels() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0]))
            .with_probabilities(true)
            .with_cache(false);

        let result = service.predict("churn", &request).await.unwrap();

        assert_eq!(result.prediction, json!("positive"));
        assert!((result.confidence_score.unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(result.probabilities.as_ref().map(Vec::len), Some(2));
        assert_eq!(result.metadata.model_version, "1.0.0-demo");
        assert!(result.metadata.preprocessing_applied);
        assert!(!result.metadata.low_confidence);
        assert!(!result.metadata.cache_used);

        let negative = PredictionRequest::new(features([-1.0, -1.0, -1.0, -1.0])).with_cache(false);
        let result = service.predict("churn", &negative).await.unwrap();
        assert_eq!(result.prediction, json!("negative"));
        assert!(result.confidence_score.is_none());
    }

    #[tokio::test]
    async fn test_low_confidence_flagged() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, -1.0, -1.0, -1.0]))
            .with_probabilities(true)
            .with_cache(false);

        let result = service.predict("churn", &request).await.unwrap();

        assert_eq!(result.prediction, json!("negative"));
        assert!(result.metadata.low_confidence);
    }

    #[tokio::test]
    async fn test_unknown_model_records_failure() {
        let (service, _) = service(&[], ServiceConfig::default());
        let request = PredictionRequest::new(features([0.0; 4]));

        let err = service.predict("ghost", &request).await.unwrap_err();

        assert!(matches!(err, Error::ModelNotFound { .. }));
        assert_eq!(err.public_message(), "Model not found");
        let stats = service.metrics().models["ghost"].clone();
        assert_eq!(stats.total_predictions, 1);
        assert_eq!(stats.failed_predictions, 1);
        assert_eq!(service.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_is_not_recorded() {
        let (service, source) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(Payload::new());

        let err = service.predict("churn", &request).await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest { .. }));
        assert_eq!(source.fetches(), 0);
        assert_eq!(service.metrics().global.total_requests, 0);
    }

    #[tokio::test]
    async fn test_non_numeric_input_is_inference_failure() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(payload(json!({
            "feature_1": "high", "feature_2": 1, "feature_3": 1, "feature_4": 1
        })));

        let err = service.predict("churn", &request).await.unwrap_err();

        assert!(matches!(err, Error::Inference { .. }));
        assert_eq!(err.public_message(), "Prediction failed");
        assert_eq!(service.metrics().models["churn"].failed_predictions, 1);
    }

    #[tokio::test]
    async fn test_missing_field_filled_by_preprocessing() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(payload(json!({
            "feature_1": 1.0, "feature_2": 1.0, "feature_3": 1.0, "feature_4": null
        })));

        let result = service.predict("churn", &request).await.unwrap();

        assert!(!result.metadata.preprocessing_degraded);
        assert_eq!(result.prediction, json!("positive"));
    }

    #[tokio::test]
    async fn test_result_cache_reuses_predictions() {
        let (service, source) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0]));

        let first = service.predict("churn", &request).await.unwrap();
        let second = service.predict("churn", &request).await.unwrap();

        assert!(!first.metadata.cache_used);
        assert!(second.metadata.cache_used);
        assert_eq!(first.prediction, second.prediction);
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(source.fetches(), 1);

        let metrics = service.metrics();
        assert_eq!(metrics.global.result_cache_hits, 1);
        assert_eq!(metrics.global.cache_misses, 1);
        assert_eq!(metrics.global.cache_hits, 0);
        assert_eq!(metrics.models["churn"].successful_predictions, 2);
    }

    #[tokio::test]
    async fn test_reload_and_unload_invalidate_cached_results() {
        let (service, source) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0]));

        let first = service.predict("churn", &request).await.unwrap();
        assert_eq!(first.prediction, json!("positive"));

        let mut updated = seere::demo_artifact("churn");
        updated.version = "2.0.0".to_string();
        updated.postprocessing = payload(json!({"class_mapping": {"0": "no", "1": "yes"}}));
        source.inner().insert_artifact("churn", &updated).unwrap();

        let info = service.reload("churn").await.unwrap();
        assert_eq!(info.version, "2.0.0");

        let after_reload = service.predict("churn", &request).await.unwrap();
        assert!(!after_reload.metadata.cache_used);
        assert_eq!(after_reload.prediction, json!("yes"));
        assert_eq!(after_reload.metadata.model_version, "2.0.0");
        assert!(service.predict("churn", &request).await.unwrap().metadata.cache_used);

        assert!(service.unload("churn").await);
        let after_unload = service.predict("churn", &request).await.unwrap();
        assert!(!after_unload.metadata.cache_used);
        assert_eq!(source.fetches(), 3);
    }

    #[tokio::test]
    async fn test_eviction_invalidates_cached_results() {
        let config = ServiceConfig::builder().max_models_in_memory(1).build();
        let (service, source) = service(&["a", "b"], config);
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0]));

        service.predict("a", &request).await.unwrap();
        service.predict("b", &request).await.unwrap();
        assert_eq!(service.loaded_models(), vec!["b".to_string()]);

        let again = service.predict("a", &request).await.unwrap();
        assert!(!again.metadata.cache_used);
        assert_eq!(source.fetches(), 3);
        assert_eq!(service.metrics().global.result_cache_hits, 0);
    }

    #[tokio::test]
    async fn test_cache_disabled_hits_registry() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0])).with_cache(false);

        service.predict("churn", &request).await.unwrap();
        let second = service.predict("churn", &request).await.unwrap();

        assert!(!second.metadata.cache_used);
        let global = service.metrics().global;
        assert_eq!(global.cache_hits, 1);
        assert!((global.cache_hit_rate - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = BatchPredictionRequest::new(vec![
            features([1.0, 1.0, 1.0, 1.0]),
            features([-1.0, -1.0, -1.0, -1.0]),
            features([1.0, 1.0, 1.0, 1.0]),
        ]);

        let result = service.predict_batch("churn", &request).await.unwrap();

        assert_eq!(result.batch_size, 3);
        let labels: Vec<&Value> = result.predictions.iter().map(|p| &p.prediction).collect();
        assert_eq!(labels, vec![&json!("positive"), &json!("negative"), &json!("positive")]);
        assert!(
            (result.average_processing_time_ms * 3.0 - result.total_processing_time_ms).abs()
                < 1e-9
        );
        assert_eq!(service.metrics().models["churn"].total_predictions, 3);
    }

    #[tokio::test]
    async fn test_batch_fails_as_a_whole() {
        let (service, _) = service(&["churn"], ServiceConfig::default());
        let request = BatchPredictionRequest::new(vec![
            features([1.0, 1.0, 1.0, 1.0]),
            payload(json!({"feature_1": "bad"})),
        ]);

        let err = service.predict_batch("churn", &request).await.unwrap_err();

        assert!(matches!(err, Error::Inference { .. }));
        let stats = service.metrics().models["churn"].clone();
        assert_eq!(stats.failed_predictions, 2);
        assert_eq!(stats.successful_predictions, 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let config = ServiceConfig::builder().max_batch_size(2).build();
        let (service, source) = service(&["churn"], config);
        let request = BatchPredictionRequest::new(vec![features([0.0; 4]); 3]);

        let err = service.predict_batch("churn", &request).await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest { .. }));
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_admin_operations() {
        let (service, source) = service(&["a", "b"], ServiceConfig::default());
        let request = PredictionRequest::new(features([1.0, 1.0, 1.0, 1.0])).with_cache(false);

        service.predict("a", &request).await.unwrap();
        service.predict("b", &request).await.unwrap();
        assert_eq!(service.loaded_models(), vec!["b".to_string(), "a".to_string()]);

        let info = service.model_info("a").unwrap();
        assert_eq!(info.framework, "random_forest");
        assert!(info.probabilistic);
        assert_eq!(info.prediction_count, 1);
        assert!(!info.past_ttl);

        let reloaded = service.reload("a").await.unwrap();
        assert_eq!(reloaded.prediction_count, 0);
        assert_eq!(source.fetches(), 3);

        assert!(service.unload("a").await);
        assert!(matches!(
            service.model_info("a"),
            Err(Error::ModelNotFound { .. })
        ));
        assert_eq!(service.health().loaded_models, 1);
        assert_eq!(service.health().status, "healthy");
    }

    #[tokio::test]
    async fn test_startup_and_shutdown() {
        let config = ServiceConfig::builder()
            .preload("a")
            .preload("missing")
            .preload("b")
            .build();
        let (service, _) = service(&["a", "b"], config);

        assert_eq!(service.startup().await, 2);
        assert_eq!(service.loaded_count(), 2);

        service.shutdown().await;
        assert_eq!(service.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_capacity_bound_through_service() {
        let config = ServiceConfig::builder().max_models_in_memory(2).build();
        let (service, _) = service(&["a", "b", "c"], config);
        let request = PredictionRequest::new(features([0.5; 4])).with_cache(false);

        for id in ["a", "b", "c"] {
            service.predict(id, &request).await.unwrap();
        }

        assert_eq!(service.loaded_models(), vec!["c".to_string(), "b".to_string()]);
        let metrics = service.metrics();
        assert_eq!(metrics.global.evictions, 1);
        assert!(!metrics.models.contains_key("a"));
    }

    #[derive(Debug)]
    struct SlowPredictor;

    impl orobas::Predictor for SlowPredictor {
        fn framework(&self) -> orobas::Framework {
            orobas::Framework::LinearRegression
        }

        fn n_features(&self) -> usize {
            1
        }

        fn predict(&self, _features: &[f64]) -> std::result::Result<Value, orobas::PredictError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(json!(0.0))
        }
    }

    fn slow_entry() -> Arc<ModelEntry> {
        Arc::new(ModelEntry::from(seere::LoadedModel {
            model_id: "slow".to_string(),
            predictor: Arc::new(SlowPredictor),
            version: "1".to_string(),
            framework: orobas::Framework::LinearRegression,
            feature_order: None,
            preprocessing: Payload::new(),
            postprocessing: Payload::new(),
            load_duration: Duration::ZERO,
        }))
    }

    #[tokio::test]
    async fn test_inference_deadline() {
        let input = payload(json!({"x": 1.0}));

        let err = infer(slow_entry(), input.clone(), false, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.public_message(), "Prediction timed out");

        let raw = infer(slow_entry(), input, false, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(raw.prediction, json!(0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ServiceConfig::builder().max_models_in_memory(0).build();
        let source = CountingSource::with_demo_models(&[], Duration::ZERO);

        let result =
            PredictionService::new(config, loader(&source), Arc::new(MemoryResultCache::new()));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
