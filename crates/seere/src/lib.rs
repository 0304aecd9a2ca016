//! # Seere
//!
//! *"The Prince who goes and returns in the twinkling of an eye"*
//!
//! Seere fetches model artifacts and turns them into ready-to-serve
//! predictors. It is stateless: every call to [`ArtifactLoader::load`] hits
//! the underlying source, and caching is left to the registry.
//!
//! ## Sources
//!
//! - [`FilesystemSource`]: `<root>/<model_id>.json`
//! - [`MemorySource`]: in-process map for tests and embedding applications
//! - [`DemoSource`]: a deterministic demo classifier for any identifier
//! - [`FallbackSource`]: tries a primary source, then a fallback

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod loader;
pub mod source;

pub use artifact::{demo_artifact, encode_artifact, ModelArtifact, ARTIFACT_EXTENSION};
pub use loader::{ArtifactLoader, LoadedModel};
pub use source::{ArtifactSource, DemoSource, FallbackSource, FilesystemSource, MemorySource};
