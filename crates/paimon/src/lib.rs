//! # Paimon
//!
//! *"The King who teaches all arts and sciences"*
//!
//! Paimon is the serving core of Augury: a bounded in-memory registry of
//! loaded models and the prediction service built on top of it.
//!
//! ## Features
//!
//! - **LRU Registry**: a hard cap on resident models, least recently used out first
//! - **Single-Flight Loading**: concurrent cold requests for one model share a single load
//! - **Result Cache**: short-lived reuse of whole prediction results
//! - **Prediction Service**: single and batch prediction plus admin operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod entry;
pub mod registry;
pub mod service;

#[cfg(test)]
mod test_support;

pub use cache::{cache_key, MemoryResultCache, ResultCache};
pub use entry::ModelEntry;
pub use registry::ModelRegistry;
pub use service::{HealthStatus, PredictionService};
