//! Bounded model registry.
//!
//! Resident models live in a map under one short-lived lock, ordered by a
//! logical access clock. Loading happens outside that lock behind a
//! per-identifier gate, so a cold model is fetched once no matter how many
//! requests arrive for it, while different models load in parallel.
//!
//! When a model leaves the registry or is replaced, its cached prediction
//! results are invalidated as well.

use std::collections::HashMap;
use std::sync::Arc;

use augury_core::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use seere::ArtifactLoader;
use vassago::MetricsCollector;

use crate::cache::ResultCache;
use crate::entry::ModelEntry;

type Gates = DashMap<String, Arc<tokio::sync::Mutex<()>>>;

struct Slot {
    entry: Arc<ModelEntry>,
    tick: u64,
    last_access: DateTime<Utc>,
}

#[derive(Default)]
struct RegistryState {
    slots: HashMap<String, Slot>,
    clock: u64,
}

impl RegistryState {
    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, model_id: &str) -> Option<Arc<ModelEntry>> {
        let tick = self.next_tick();
        let slot = self.slots.get_mut(model_id)?;
        slot.tick = tick;
        slot.last_access = Utc::now();
        Some(Arc::clone(&slot.entry))
    }

    /// Inserts an entry and returns whatever had to go to stay within `max`.
    fn insert(&mut self, entry: Arc<ModelEntry>, max: usize) -> Vec<Arc<ModelEntry>> {
        let tick = self.next_tick();
        self.slots.insert(
            entry.model_id.clone(),
            Slot {
                entry,
                tick,
                last_access: Utc::now(),
            },
        );

        let mut evicted = Vec::new();
        while self.slots.len() > max {
            let Some(victim) =
                lru_victim(self.slots.iter().map(|(id, slot)| (id.as_str(), slot.tick)))
                    .map(str::to_string)
            else {
                break;
            };
            if let Some(slot) = self.slots.remove(&victim) {
                evicted.push(slot.entry);
            }
        }
        evicted
    }
}

/// Picks the least recently used identifier. Equal ticks go to the smallest id.
pub(crate) fn lru_victim<'a>(slots: impl Iterator<Item = (&'a str, u64)>) -> Option<&'a str> {
    slots
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(id, _)| id)
}

/// Removes a load gate once nobody holds it, including when the waiting
/// future is dropped.
struct GateCleanup<'a> {
    gates: &'a Gates,
    model_id: &'a str,
}

impl Drop for GateCleanup<'_> {
    fn drop(&mut self) {
        self.gates
            .remove_if(self.model_id, |_, gate| Arc::strong_count(gate) == 1);
    }
}

/// Registry of resident models.
pub struct ModelRegistry {
    state: Mutex<RegistryState>,
    gates: Gates,
    loader: ArtifactLoader,
    metrics: Arc<MetricsCollector>,
    result_cache: Option<Arc<dyn ResultCache>>,
    max_models: usize,
}

impl ModelRegistry {
    /// Creates a registry holding at most `max_models` models.
    #[must_use]
    pub fn new(loader: ArtifactLoader, metrics: Arc<MetricsCollector>, max_models: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            gates: DashMap::new(),
            loader,
            metrics,
            result_cache: None,
            max_models: max_models.max(1),
        }
    }

    /// Invalidates results in `cache` whenever a model is evicted, unloaded
    /// or reloaded.
    #[must_use]
    pub fn with_result_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.result_cache = Some(cache);
        self
    }

    /// Maximum number of resident models.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_models
    }

    /// Returns the model, loading it first if it is not resident.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if no artifact exists, or the
    /// loader's error if the artifact cannot be used.
    pub async fn get_or_load(&self, model_id: &str) -> Result<Arc<ModelEntry>> {
        if let Some(entry) = self.lookup(model_id) {
            return Ok(entry);
        }

        // Declared before the gate so it runs after the gate is dropped.
        let _cleanup = self.gate_cleanup(model_id);
        let gate = self.gate(model_id);
        let _guard = gate.lock().await;

        match self.lookup(model_id) {
            Some(entry) => Ok(entry),
            None => {
                self.metrics.record_cache_miss();
                self.load_and_insert(model_id).await
            }
        }
    }

    /// Loads the model again and replaces any resident copy.
    ///
    /// Predictions already holding the old entry finish against it.
    ///
    /// # Errors
    ///
    /// Same as [`get_or_load`](Self::get_or_load). A failed reload leaves
    /// the resident copy in place.
    pub async fn force_reload(&self, model_id: &str) -> Result<Arc<ModelEntry>> {
        let _cleanup = self.gate_cleanup(model_id);
        let gate = self.gate(model_id);
        let _guard = gate.lock().await;

        self.metrics.record_cache_miss();
        let entry = self.load_and_insert(model_id).await?;
        self.invalidate_results(model_id).await;
        Ok(entry)
    }

    /// Removes a model. Returns whether it was resident.
    pub async fn evict(&self, model_id: &str) -> bool {
        let removed = self.state.lock().slots.remove(model_id);
        match removed {
            Some(_) => {
                self.metrics.forget_model(model_id);
                self.invalidate_results(model_id).await;
                tracing::info!(model_id, "Model unloaded");
                true
            }
            None => false,
        }
    }

    /// Number of resident models.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Resident model identifiers, most recently used first.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut ids: Vec<(&String, u64)> = state
            .slots
            .iter()
            .map(|(id, slot)| (id, slot.tick))
            .collect();
        ids.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ids.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Returns a resident model without refreshing its recency.
    #[must_use]
    pub fn peek(&self, model_id: &str) -> Option<Arc<ModelEntry>> {
        self.state
            .lock()
            .slots
            .get(model_id)
            .map(|slot| Arc::clone(&slot.entry))
    }

    /// Last time a resident model was served.
    #[must_use]
    pub fn last_access(&self, model_id: &str) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .slots
            .get(model_id)
            .map(|slot| slot.last_access)
    }

    /// Removes every resident model. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let drained: Vec<String> = {
            let mut state = self.state.lock();
            state.slots.drain().map(|(id, _)| id).collect()
        };
        for model_id in &drained {
            self.invalidate_results(model_id).await;
        }
        tracing::info!(count = drained.len(), "Registry cleared");
        drained.len()
    }

    /// Returns `true` if `entry` is the copy currently resident for its id.
    #[must_use]
    pub fn is_current(&self, entry: &Arc<ModelEntry>) -> bool {
        self.state
            .lock()
            .slots
            .get(&entry.model_id)
            .is_some_and(|slot| Arc::ptr_eq(&slot.entry, entry))
    }

    fn lookup(&self, model_id: &str) -> Option<Arc<ModelEntry>> {
        let entry = self.state.lock().touch(model_id)?;
        self.metrics.record_cache_hit();
        self.metrics.record_access(model_id);
        Some(entry)
    }

    async fn load_and_insert(&self, model_id: &str) -> Result<Arc<ModelEntry>> {
        let loaded = self.loader.load(model_id).await.map_err(|e| {
            tracing::warn!(model_id, error = %e, "Model load failed");
            match e {
                Error::ArtifactUnavailable { model_id } => Error::ModelNotFound { model_id },
                other => other,
            }
        })?;

        let entry = Arc::new(ModelEntry::from(loaded));
        let evicted = self.state.lock().insert(Arc::clone(&entry), self.max_models);
        self.metrics.record_access(model_id);

        for victim in evicted {
            self.metrics.record_eviction();
            self.metrics.forget_model(&victim.model_id);
            self.invalidate_results(&victim.model_id).await;
            tracing::info!(
                model_id = %victim.model_id,
                loaded = model_id,
                "Evicted least recently used model"
            );
        }

        Ok(entry)
    }

    async fn invalidate_results(&self, model_id: &str) {
        if let Some(cache) = &self.result_cache {
            let dropped = cache.invalidate_model(model_id).await;
            if dropped > 0 {
                tracing::debug!(model_id, dropped, "Invalidated cached results");
            }
        }
    }

    fn gate(&self, model_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(&self.gates.entry(model_id.to_string()).or_default())
    }

    fn gate_cleanup<'a>(&'a self, model_id: &'a str) -> GateCleanup<'a> {
        GateCleanup {
            gates: &self.gates,
            model_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;
    use crate::test_support::{loader, CountingSource};

    fn registry(source: &Arc<CountingSource>, max: usize) -> (ModelRegistry, Arc<MetricsCollector>) {
        let metrics = Arc::new(MetricsCollector::default());
        (
            ModelRegistry::new(loader(source), Arc::clone(&metrics), max),
            metrics,
        )
    }

    #[test]
    fn test_lru_victim_prefers_oldest_then_smallest_id() {
        let slots = [("b", 3), ("c", 1), ("a", 2)];
        assert_eq!(lru_victim(slots.iter().copied()), Some("c"));

        let tied = [("zeta", 5), ("alpha", 5), ("mid", 5)];
        assert_eq!(lru_victim(tied.iter().copied()), Some("alpha"));

        assert_eq!(lru_victim(std::iter::empty()), None);
    }

    #[tokio::test]
    async fn test_capacity_two_evicts_first() {
        let source = CountingSource::with_demo_models(&["a", "b", "c"], Duration::ZERO);
        let (registry, metrics) = registry(&source, 2);

        registry.get_or_load("a").await.unwrap();
        registry.get_or_load("b").await.unwrap();
        registry.get_or_load("c").await.unwrap();

        assert_eq!(registry.count(), 2);
        assert_eq!(registry.list_ids(), vec!["c".to_string(), "b".to_string()]);
        assert!(registry.peek("a").is_none());
        assert_eq!(metrics.global_snapshot().evictions, 1);
        assert!(metrics.model_snapshot("a").is_none());
    }

    #[tokio::test]
    async fn test_hit_refreshes_recency() {
        let source = CountingSource::with_demo_models(&["a", "b", "c"], Duration::ZERO);
        let (registry, _) = registry(&source, 2);

        registry.get_or_load("a").await.unwrap();
        registry.get_or_load("b").await.unwrap();
        registry.get_or_load("a").await.unwrap();
        registry.get_or_load("c").await.unwrap();

        assert!(registry.peek("a").is_some());
        assert!(registry.peek("b").is_none());
        assert_eq!(registry.list_ids(), vec!["c".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_second_lookup_is_hit() {
        let source = CountingSource::with_demo_models(&["a"], Duration::ZERO);
        let (registry, metrics) = registry(&source, 4);

        let first = registry.get_or_load("a").await.unwrap();
        let second = registry.get_or_load("a").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches(), 1);
        let global = metrics.global_snapshot();
        assert_eq!(global.cache_hits, 1);
        assert_eq!(global.cache_misses, 1);
        assert!(metrics.model_snapshot("a").unwrap().last_access.is_some());
    }

    #[tokio::test]
    async fn test_force_reload_replaces_entry() {
        let source = CountingSource::with_demo_models(&["a"], Duration::ZERO);
        let (registry, metrics) = registry(&source, 4);

        let first = registry.get_or_load("a").await.unwrap();
        let reloaded = registry.force_reload("a").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(source.fetches(), 2);
        assert_eq!(registry.count(), 1);
        assert_eq!(metrics.global_snapshot().cache_misses, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cold_requests_load_once() {
        let source = CountingSource::with_demo_models(&["a"], Duration::from_millis(50));
        let (registry, metrics) = registry(&source, 4);

        let results = join_all((0..16).map(|_| registry.get_or_load("a"))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(source.fetches(), 1);
        let global = metrics.global_snapshot();
        assert_eq!(global.cache_misses, 1);
        assert_eq!(global.cache_hits, 15);
        assert!(registry.gates.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_respect_capacity() {
        let ids = ["a", "b", "c", "d", "e", "f"];
        let source = CountingSource::with_demo_models(&ids, Duration::from_millis(10));
        let (registry, metrics) = registry(&source, 3);

        let results = join_all(ids.iter().map(|id| registry.get_or_load(id))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(registry.count(), 3);
        assert_eq!(metrics.global_snapshot().evictions, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_models_load_in_parallel() {
        let ids = ["a", "b", "c", "d"];
        // Each fetch blocks until all four are in flight, so serialized loads
        // would never finish.
        let source = CountingSource::with_barrier(&ids, ids.len());
        let (registry, _) = registry(&source, 4);

        let results = tokio::time::timeout(
            Duration::from_secs(5),
            join_all(ids.iter().map(|id| registry.get_or_load(id))),
        )
        .await
        .expect("distinct models should load concurrently");

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(source.fetches(), 4);
        assert_eq!(registry.count(), 4);
        assert!(registry.gates.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_waiter_releases_gate() {
        let source = CountingSource::with_demo_models(&["a"], Duration::from_millis(50));
        let (registry, _) = registry(&source, 2);

        let mut loading = Box::pin(registry.get_or_load("a"));
        let mut waiting = Box::pin(registry.get_or_load("a"));

        assert!(futures::poll!(loading.as_mut()).is_pending());
        assert!(futures::poll!(waiting.as_mut()).is_pending());
        assert_eq!(registry.gates.len(), 1);

        loading.await.unwrap();
        assert_eq!(registry.gates.len(), 1);

        drop(waiting);
        assert!(registry.gates.is_empty());
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_unknown_model_not_found() {
        let source = CountingSource::with_demo_models(&[], Duration::ZERO);
        let (registry, _) = registry(&source, 2);

        let err = registry.get_or_load("ghost").await.unwrap_err();

        assert!(matches!(err, Error::ModelNotFound { ref model_id } if model_id == "ghost"));
        assert_eq!(registry.count(), 0);
        assert!(registry.gates.is_empty());
    }

    #[tokio::test]
    async fn test_evicted_entry_outlives_index() {
        let source = CountingSource::with_demo_models(&["a"], Duration::ZERO);
        let (registry, _) = registry(&source, 2);

        let held = registry.get_or_load("a").await.unwrap();
        assert!(registry.evict("a").await);
        assert!(!registry.evict("a").await);

        assert_eq!(registry.count(), 0);
        assert_eq!(held.predictor.n_features(), 4);
    }

    #[tokio::test]
    async fn test_peek_does_not_refresh() {
        let source = CountingSource::with_demo_models(&["a", "b", "c"], Duration::ZERO);
        let (registry, metrics) = registry(&source, 2);

        registry.get_or_load("a").await.unwrap();
        registry.get_or_load("b").await.unwrap();
        assert!(registry.peek("a").is_some());
        registry.get_or_load("c").await.unwrap();

        assert!(registry.peek("a").is_none());
        assert_eq!(metrics.global_snapshot().cache_hits, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let source = CountingSource::with_demo_models(&["a", "b"], Duration::ZERO);
        let (registry, _) = registry(&source, 4);

        registry.get_or_load("a").await.unwrap();
        registry.get_or_load("b").await.unwrap();

        assert_eq!(registry.clear().await, 2);
        assert_eq!(registry.count(), 0);
    }
}
