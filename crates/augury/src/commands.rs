//! CLI command implementations.

use std::path::Path;

use augury_core::{BatchPredictionRequest, Payload, PredictionRequest, ServiceConfig};
use color_eyre::eyre::{bail, eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use paimon::PredictionService;
use seere::{demo_artifact, FilesystemSource};
use serde::Serialize;
use serde_json::Value;

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn start_service(config: ServiceConfig) -> Result<PredictionService> {
    tracing::info!(
        model_dir = %config.model_dir.display(),
        demo = config.demo_fallback,
        "Starting prediction service"
    );
    let service = PredictionService::from_config(config)?;
    service.startup().await;
    Ok(service)
}

/// Parses a JSON object given on the command line.
pub fn parse_payload(input: &str) -> Result<Payload> {
    match serde_json::from_str::<Value>(input)? {
        Value::Object(map) => Ok(map),
        other => bail!("Input must be a JSON object, got: {other}"),
    }
}

/// Parses batch inputs: a JSON array of objects, or `{"inputs": [...]}`.
pub fn parse_batch_inputs(contents: &str) -> Result<Vec<Payload>> {
    let items = match serde_json::from_str::<Value>(contents)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("inputs") {
            Some(Value::Array(items)) => items,
            _ => bail!("Expected a JSON array or an object with an \"inputs\" array"),
        },
        _ => bail!("Expected a JSON array or an object with an \"inputs\" array"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(eyre!("Input {idx} is not a JSON object: {other}")),
        })
        .collect()
}

/// Run one prediction and print the result.
pub async fn predict(
    config: ServiceConfig,
    model: &str,
    input: &str,
    probabilities: bool,
    use_cache: bool,
) -> Result<()> {
    let payload = parse_payload(input)?;
    let service = start_service(config).await?;

    let request = PredictionRequest::new(payload)
        .with_probabilities(probabilities)
        .with_cache(use_cache);

    let progress = spinner(format!("Predicting with {model}..."))?;
    let result = service.predict(model, &request).await;
    progress.finish_and_clear();

    print_json(&result?)?;
    service.shutdown().await;
    Ok(())
}

/// Run a batch of predictions from a file and print the results.
pub async fn batch(
    config: ServiceConfig,
    model: &str,
    inputs: &Path,
    probabilities: bool,
    show_metrics: bool,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(inputs)
        .await
        .map_err(|e| eyre!("Failed to read {}: {e}", inputs.display()))?;
    let payloads = parse_batch_inputs(&contents)?;
    tracing::debug!("Read {} inputs from {:?}", payloads.len(), inputs);
    let service = start_service(config).await?;

    let request = BatchPredictionRequest::new(payloads).with_probabilities(probabilities);

    let progress = spinner(format!("Running {} predictions with {model}...", request.len()))?;
    let result = service.predict_batch(model, &request).await;
    progress.finish_and_clear();

    print_json(&result?)?;
    if show_metrics {
        print_json(&service.metrics())?;
    }
    service.shutdown().await;
    Ok(())
}

/// Write a demo artifact into the model directory.
pub async fn model_init(config: &ServiceConfig, model: &str, force: bool) -> Result<()> {
    let source = FilesystemSource::new(config.model_dir.clone());
    let path = source.artifact_path(model)?;

    if !force && tokio::fs::try_exists(&path).await? {
        bail!(
            "Artifact already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let path = source.store(model, &demo_artifact(model)).await?;
    tracing::debug!("Wrote demo artifact for {} to {:?}", model, path);
    println!("Demo artifact written to: {}", path.display());
    Ok(())
}

/// Load a model and print its information.
pub async fn model_info(config: ServiceConfig, model: &str) -> Result<()> {
    let service = start_service(config).await?;

    let progress = spinner(format!("Loading model {model}..."))?;
    let loaded = service.registry().get_or_load(model).await;
    progress.finish_and_clear();
    loaded?;

    print_json(&service.model_info(model)?)?;
    service.shutdown().await;
    Ok(())
}
