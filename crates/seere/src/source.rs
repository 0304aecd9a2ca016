//! Artifact sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use augury_core::{Error, Result};
use dashmap::DashMap;

use crate::artifact::{demo_artifact, encode_artifact, ModelArtifact, ARTIFACT_EXTENSION};

/// A store that can hand out artifact bytes by model identifier.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetches the artifact for `model_id`.
    ///
    /// Returns `Ok(None)` when the source holds no such artifact.
    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>>;
}

/// Artifacts stored as `<root>/<model_id>.json`.
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path an artifact for `model_id` lives at.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for identifiers that could escape the root.
    pub fn artifact_path(&self, model_id: &str) -> Result<PathBuf> {
        if model_id.is_empty()
            || model_id.starts_with('.')
            || model_id.contains(['/', '\\'])
            || model_id.contains("..")
        {
            return Err(Error::invalid_request(format!(
                "invalid model identifier: {model_id:?}"
            )));
        }
        Ok(self.root.join(format!("{model_id}.{ARTIFACT_EXTENSION}")))
    }

    /// Writes an artifact, creating the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is invalid or the write fails.
    pub async fn store(&self, model_id: &str, artifact: &ModelArtifact) -> Result<PathBuf> {
        let path = self.artifact_path(model_id)?;
        let bytes = encode_artifact(artifact)?;

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(model_id, path = %path.display(), "Stored artifact");
        Ok(path)
    }
}

#[async_trait]
impl ArtifactSource for FilesystemSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.artifact_path(model_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(model_id, path = %path.display(), "Artifact file not found");
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Artifacts held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    artifacts: DashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw artifact bytes.
    pub fn insert(&self, model_id: impl Into<String>, bytes: Vec<u8>) {
        self.artifacts.insert(model_id.into(), bytes);
    }

    /// Encodes and stores an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn insert_artifact(&self, model_id: impl Into<String>, artifact: &ModelArtifact) -> Result<()> {
        self.insert(model_id, encode_artifact(artifact)?);
        Ok(())
    }

    /// Removes an artifact. Returns whether one was present.
    pub fn remove(&self, model_id: &str) -> bool {
        self.artifacts.remove(model_id).is_some()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns `true` if no artifacts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[async_trait]
impl ArtifactSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.get(model_id).map(|bytes| bytes.clone()))
    }
}

/// Serves the demo classifier for every identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

#[async_trait]
impl ArtifactSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        tracing::warn!(model_id, "Serving demo artifact");
        encode_artifact(&demo_artifact(model_id)).map(Some)
    }
}

/// Tries `primary` first and falls back when it has no artifact.
///
/// Errors from the primary source are returned as-is.
pub struct FallbackSource {
    primary: Arc<dyn ArtifactSource>,
    fallback: Arc<dyn ArtifactSource>,
}

impl FallbackSource {
    /// Chains two sources.
    #[must_use]
    pub fn new(primary: Arc<dyn ArtifactSource>, fallback: Arc<dyn ArtifactSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ArtifactSource for FallbackSource {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn fetch(&self, model_id: &str) -> Result<Option<Vec<u8>>> {
        if let Some(bytes) = self.primary.fetch(model_id).await? {
            return Ok(Some(bytes));
        }
        tracing::debug!(
            model_id,
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            "Primary source empty, trying fallback"
        );
        self.fallback.fetch(model_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilesystemSource::new(dir.path().join("models"));

        assert!(source.fetch("churn").await.unwrap().is_none());

        let path = source.store("churn", &demo_artifact("churn")).await.unwrap();
        assert_eq!(path, dir.path().join("models").join("churn.json"));

        let bytes = source.fetch("churn").await.unwrap().unwrap();
        let artifact = ModelArtifact::from_slice("churn", &bytes).unwrap();
        assert_eq!(artifact.version, "1.0.0-demo");
    }

    #[tokio::test]
    async fn test_filesystem_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilesystemSource::new(dir.path());

        for id in ["../etc/passwd", "a/b", "a\\b", "..", ".hidden", ""] {
            let err = source.fetch(id).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest { .. }), "accepted {id:?}");
        }
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new();
        assert!(source.fetch("m1").await.unwrap().is_none());

        source.insert("m1", b"{}".to_vec());
        assert_eq!(source.fetch("m1").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(source.len(), 1);

        assert!(source.remove("m1"));
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_prefers_primary() {
        let primary = Arc::new(MemorySource::new());
        primary.insert("real", b"primary".to_vec());
        let source = FallbackSource::new(primary, Arc::new(DemoSource));

        assert_eq!(source.fetch("real").await.unwrap(), Some(b"primary".to_vec()));

        let demo = source.fetch("missing").await.unwrap().unwrap();
        assert!(ModelArtifact::from_slice("missing", &demo).is_ok());
    }
}
