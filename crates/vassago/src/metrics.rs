//! Metrics collection for prediction performance.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

/// Response-time samples retained per model.
pub const SAMPLE_CAPACITY: usize = 1000;

/// Default cap on the number of models with live stats.
pub const DEFAULT_MAX_TRACKED_MODELS: usize = 1000;

/// Per-model counters and recent latency samples.
#[derive(Debug)]
struct ModelStats {
    total_predictions: u64,
    successful_predictions: u64,
    failed_predictions: u64,
    total_response_ms: f64,
    recent: VecDeque<f64>,
    last_prediction: Option<DateTime<Utc>>,
    last_access: Option<DateTime<Utc>>,
    /// Collector tick of the latest update, used to pick cap victims.
    active: u64,
}

impl ModelStats {
    fn new() -> Self {
        Self {
            total_predictions: 0,
            successful_predictions: 0,
            failed_predictions: 0,
            total_response_ms: 0.0,
            recent: VecDeque::with_capacity(64),
            last_prediction: None,
            last_access: None,
            active: 0,
        }
    }

    fn record(&mut self, response_time_ms: f64, success: bool) {
        self.total_predictions += 1;
        if success {
            self.successful_predictions += 1;
        } else {
            self.failed_predictions += 1;
        }
        self.total_response_ms += response_time_ms;

        if self.recent.len() >= SAMPLE_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(response_time_ms);
        self.last_prediction = Some(Utc::now());
    }

    #[allow(clippy::cast_precision_loss)]
    fn snapshot(&self, model_id: &str) -> ModelStatsSnapshot {
        let (success_rate, average) = if self.total_predictions == 0 {
            (0.0, 0.0)
        } else {
            let n = self.total_predictions as f64;
            (
                self.successful_predictions as f64 / n,
                self.total_response_ms / n,
            )
        };

        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        ModelStatsSnapshot {
            model_id: model_id.to_string(),
            total_predictions: self.total_predictions,
            successful_predictions: self.successful_predictions,
            failed_predictions: self.failed_predictions,
            success_rate,
            average_response_time_ms: average,
            min_response_time_ms: sorted.first().copied().unwrap_or(0.0),
            max_response_time_ms: sorted.last().copied().unwrap_or(0.0),
            median_response_time_ms: sorted.get(sorted.len() / 2).copied().unwrap_or(0.0),
            samples: sorted.len(),
            last_prediction: self.last_prediction,
            last_access: self.last_access,
        }
    }
}

/// Point-in-time view of one model's stats.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatsSnapshot {
    /// Model identifier.
    pub model_id: String,
    /// Predictions recorded.
    pub total_predictions: u64,
    /// Successful predictions.
    pub successful_predictions: u64,
    /// Failed predictions.
    pub failed_predictions: u64,
    /// Successes over total, 0 with no predictions.
    pub success_rate: f64,
    /// Cumulative average response time.
    pub average_response_time_ms: f64,
    /// Fastest retained sample.
    pub min_response_time_ms: f64,
    /// Slowest retained sample.
    pub max_response_time_ms: f64,
    /// Median of the retained samples.
    pub median_response_time_ms: f64,
    /// Number of retained samples.
    pub samples: usize,
    /// Time of the latest prediction.
    pub last_prediction: Option<DateTime<Utc>>,
    /// Time of the latest registry access.
    pub last_access: Option<DateTime<Utc>>,
}

/// Point-in-time view of the service-wide counters.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStatsSnapshot {
    /// When the collector was created.
    pub started_at: DateTime<Utc>,
    /// Seconds since `started_at`.
    pub uptime_seconds: f64,
    /// Predictions recorded across all models.
    pub total_requests: u64,
    /// Registry lookups that found the model resident.
    pub cache_hits: u64,
    /// Registry lookups that required a load.
    pub cache_misses: u64,
    /// Hits over lookups, 0 with no lookups.
    pub cache_hit_rate: f64,
    /// Models evicted from the registry.
    pub evictions: u64,
    /// Predictions answered from the result cache.
    pub result_cache_hits: u64,
    /// Models with live stats.
    pub tracked_models: usize,
}

/// Global counters plus every tracked model.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Service-wide counters.
    pub global: GlobalStatsSnapshot,
    /// Per-model stats keyed by model id.
    pub models: BTreeMap<String, ModelStatsSnapshot>,
}

/// Collector for prediction and cache metrics.
///
/// Global counters are atomics; per-model stats sit behind their own lock, so
/// recording never contends with the model registry.
pub struct MetricsCollector {
    started_at: DateTime<Utc>,
    started: Instant,
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    evictions: AtomicU64,
    result_cache_hits: AtomicU64,
    models: DashMap<String, Mutex<ModelStats>>,
    clock: AtomicU64,
    max_tracked_models: usize,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED_MODELS)
    }
}

impl MetricsCollector {
    /// Creates a collector tracking at most `max_tracked_models` models.
    #[must_use]
    pub fn new(max_tracked_models: usize) -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            total_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            result_cache_hits: AtomicU64::new(0),
            models: DashMap::new(),
            clock: AtomicU64::new(0),
            max_tracked_models: max_tracked_models.max(1),
        }
    }

    /// Records one prediction attempt.
    pub fn record_prediction(&self, model_id: &str, response_time_ms: f64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.with_stats(model_id, |stats| stats.record(response_time_ms, success));
        tracing::trace!(model_id, response_time_ms, success, "Recorded prediction");
    }

    /// Records a batch as `batch_size` predictions sharing the total time.
    ///
    /// A zero-size batch records one sample of the whole time.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_batch(&self, model_id: &str, batch_size: usize, total_time_ms: f64, success: bool) {
        if batch_size == 0 {
            self.record_prediction(model_id, total_time_ms, success);
            return;
        }

        let per_item = total_time_ms / batch_size as f64;
        self.total_requests
            .fetch_add(batch_size as u64, Ordering::Relaxed);
        self.with_stats(model_id, |stats| {
            for _ in 0..batch_size {
                stats.record(per_item, success);
            }
        });
        tracing::debug!(model_id, batch_size, total_time_ms, success, "Recorded batch");
    }

    /// Records a registry lookup that found the model resident.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a registry lookup that required a load.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a registry eviction.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a prediction served from the result cache.
    pub fn record_result_cache_hit(&self) {
        self.result_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a model as accessed.
    pub fn record_access(&self, model_id: &str) {
        self.with_stats(model_id, |stats| stats.last_access = Some(Utc::now()));
    }

    /// Drops the stats of a model. Returns whether any were tracked.
    ///
    /// A later recording for the same id, such as a prediction that finishes
    /// after its model was evicted, starts a fresh entry under the
    /// `max_tracked_models` cap.
    pub fn forget_model(&self, model_id: &str) -> bool {
        self.models.remove(model_id).is_some()
    }

    /// Returns the stats of one model, if tracked.
    #[must_use]
    pub fn model_snapshot(&self, model_id: &str) -> Option<ModelStatsSnapshot> {
        self.models
            .get(model_id)
            .map(|stats| stats.lock().snapshot(model_id))
    }

    /// Returns the service-wide counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn global_snapshot(&self) -> GlobalStatsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;

        GlobalStatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.started.elapsed().as_secs_f64(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                cache_hits as f64 / lookups as f64
            },
            evictions: self.evictions.load(Ordering::Relaxed),
            result_cache_hits: self.result_cache_hits.load(Ordering::Relaxed),
            tracked_models: self.models.len(),
        }
    }

    /// Returns global counters and every tracked model.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let models = self
            .models
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().lock().snapshot(entry.key())))
            .collect();

        MetricsSnapshot {
            global: self.global_snapshot(),
            models,
        }
    }

    fn with_stats<R>(&self, model_id: &str, f: impl FnOnce(&mut ModelStats) -> R) -> R {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);

        let (result, inserted) = if let Some(entry) = self.models.get(model_id) {
            let mut stats = entry.lock();
            stats.active = tick;
            let result = f(&mut stats);
            (result, false)
        } else {
            let entry = self
                .models
                .entry(model_id.to_string())
                .or_insert_with(|| Mutex::new(ModelStats::new()));
            let mut stats = entry.lock();
            stats.active = tick;
            let result = f(&mut stats);
            (result, true)
        };

        if inserted {
            self.enforce_cap(model_id);
        }
        result
    }

    fn enforce_cap(&self, keep: &str) {
        while self.models.len() > self.max_tracked_models {
            let victim = self
                .models
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().lock().active)
                .map(|entry| entry.key().clone());

            let Some(victim) = victim else { break };
            self.models.remove(&victim);
            tracing::debug!(model_id = %victim, "Dropped stats of least active model");
        }
    }
}

/// Timer for measuring operation duration.
pub struct Timer {
    start: Instant,
    label: &'static str,
}

impl Timer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer, logs and returns the elapsed milliseconds.
    pub fn stop(self) -> f64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!(label = self.label, elapsed_ms = elapsed, "Timer stopped");
        elapsed
    }
}
