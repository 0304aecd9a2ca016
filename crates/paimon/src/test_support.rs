//! Shared fixtures for registry and service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use augury_core::{Payload, Result};
use seere::{demo_artifact, ArtifactLoader, ArtifactSource, MemorySource};
use serde_json::Value;
use tokio::sync::Barrier;

/// A memory source that counts fetches and can simulate slow storage.
pub struct CountingSource {
    inner: MemorySource,
    fetches: AtomicUsize,
    delay: Duration,
    barrier: Option<Barrier>,
}

impl CountingSource {
    pub fn with_demo_models(ids: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(ids, delay, None))
    }

    /// Every fetch waits until `parties` fetches are in flight at once.
    pub fn with_barrier(ids: &[&str], parties: usize) -> Arc<Self> {
        Arc::new(Self::build(ids, Duration::ZERO, Some(Barrier::new(parties))))
    }

    fn build(ids: &[&str], delay: Duration, barrier: Option<Barrier>) -> Self {
        let inner = MemorySource::new();
        for id in ids {
            inner.insert_artifact(*id, &demo_artifact(id)).unwrap();
        }
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            delay,
            barrier,
        }
    }

    pub fn inner(&self) -> &MemorySource {
        &self.inner
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.inner.fetch(model_id).await
    }
}

pub fn loader(source: &Arc<CountingSource>) -> ArtifactLoader {
    ArtifactLoader::new(Arc::clone(source) as Arc<dyn ArtifactSource>)
}

pub fn payload(value: Value) -> Payload {
    value.as_object().cloned().unwrap()
}
