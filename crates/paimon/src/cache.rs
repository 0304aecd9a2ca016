//! Prediction result cache.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use augury_core::{Payload, PredictionResult};
use dashmap::DashMap;

/// Short-lived store of whole prediction results.
///
/// Implementations swallow their own failures: a cache that cannot answer
/// behaves like a miss.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns a live cached result.
    async fn get(&self, key: &str) -> Option<PredictionResult>;

    /// Stores a result for `ttl`.
    async fn put(&self, key: &str, result: &PredictionResult, ttl: Duration);

    /// Drops every result cached for a model. Returns how many were removed.
    async fn invalidate_model(&self, model_id: &str) -> usize;
}

fn model_prefix(model_id: &str) -> String {
    format!("pred:{model_id}:")
}

/// Builds the cache key for a prediction.
///
/// The key is `pred:<model_id>:<hash>`, where the hash covers the canonical
/// JSON of the input and whether probabilities were requested.
#[must_use]
pub fn cache_key(model_id: &str, input: &Payload, with_probabilities: bool) -> String {
    let mut hasher = DefaultHasher::new();
    serde_json::Value::Object(input.clone())
        .to_string()
        .hash(&mut hasher);
    with_probabilities.hash(&mut hasher);
    format!("{}{:016x}", model_prefix(model_id), hasher.finish())
}

struct CachedResult {
    result: PredictionResult,
    expires_at: Instant,
}

/// In-process [`ResultCache`] with lazy expiry.
#[derive(Default)]
pub struct MemoryResultCache {
    entries: DashMap<String, CachedResult>,
}

impl MemoryResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, cached| cached.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, key: &str) -> Option<PredictionResult> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(cached) if cached.expires_at > now => return Some(cached.result.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries
                .remove_if(key, |_, cached| cached.expires_at <= now);
        }
        None
    }

    async fn put(&self, key: &str, result: &PredictionResult, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CachedResult {
                result: result.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn invalidate_model(&self, model_id: &str) -> usize {
        let prefix = model_prefix(model_id);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        before.saturating_sub(self.entries.len())
    }
}
