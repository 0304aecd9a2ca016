//! Benchmarks for the registry hot path and end-to-end prediction.

use std::sync::Arc;

use augury_core::{PredictionRequest, ServiceConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use paimon::{MemoryResultCache, PredictionService};
use seere::{demo_artifact, ArtifactLoader, MemorySource};
use serde_json::json;

fn service(ids: &[String], max_models: usize) -> PredictionService {
    let source = MemorySource::new();
    for id in ids {
        source
            .insert_artifact(id.as_str(), &demo_artifact(id))
            .expect("demo artifact encodes");
    }
    let config = ServiceConfig::builder()
        .max_models_in_memory(max_models)
        .build();
    PredictionService::new(
        config,
        ArtifactLoader::new(Arc::new(source)),
        Arc::new(MemoryResultCache::new()),
    )
    .expect("valid config")
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("model-{i}")).collect()
}

// ============================================================================
// REGISTRY
// ============================================================================

fn registry_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("registry");

    let warm_ids = ids(1);
    let warm = service(&warm_ids, 4);
    rt.block_on(warm.registry().get_or_load("model-0"))
        .expect("warm load");
    group.bench_function("resident_hit", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(warm.registry().get_or_load("model-0").await) });
    });

    for capacity in [2usize, 8] {
        let churn_ids = ids(capacity * 2);
        let churn = service(&churn_ids, capacity);
        group.bench_with_input(
            BenchmarkId::new("lru_churn", capacity),
            &churn_ids,
            |b, ids| {
                let mut next = 0;
                b.to_async(&rt).iter(|| {
                    let id = ids[next % ids.len()].clone();
                    next += 1;
                    let churn = &churn;
                    async move { black_box(churn.registry().get_or_load(&id).await) }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// PREDICTION
// ============================================================================

fn predict_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let service = service(&ids(1), 4);
    let input = json!({"feature_1": 0.3, "feature_2": -0.7, "feature_3": 1.1, "feature_4": 0.0});
    let input = input.as_object().cloned().expect("object");

    let mut group = c.benchmark_group("predict");

    let uncached = PredictionRequest::new(input.clone())
        .with_probabilities(true)
        .with_cache(false);
    group.bench_function("uncached", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(service.predict("model-0", &uncached).await) });
    });

    let cached = PredictionRequest::new(input);
    group.bench_function("result_cache_hit", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(service.predict("model-0", &cached).await) });
    });

    group.finish();
}

criterion_group!(benches, registry_benchmark, predict_benchmark);
criterion_main!(benches);
