//! # Haagenti
//!
//! *"The President transmutes all metals into gold"*
//!
//! Haagenti transforms raw request payloads into model-ready input and raw
//! model output into the response contract.
//!
//! Processing never aborts a prediction. When a step fails, the untouched
//! payload is returned and the [`Processed::degraded`] flag is raised so the
//! caller can surface the fallback.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod postprocess;
pub mod preprocess;

use thiserror::Error;

pub use postprocess::{postprocess, PostprocessConfig};
pub use preprocess::{preprocess, PreprocessConfig};

/// A processed payload together with its fallback flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed<T> {
    /// The resulting payload.
    pub value: T,
    /// True when processing failed and `value` is the unmodified input.
    pub degraded: bool,
}

impl<T> Processed<T> {
    /// Wraps a successfully processed value.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    /// Wraps an unmodified fallback value.
    pub fn fallback(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

/// Failure inside a processing step.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The configuration object does not have the expected shape.
    #[error("invalid processing config: {0}")]
    Config(#[from] serde_json::Error),

    /// Normalization with a zero standard deviation.
    #[error("std must be non-zero")]
    ZeroStd,

    /// A transformed value is NaN or infinite.
    #[error("field '{0}' became non-finite")]
    NonFinite(String),

    /// The payload has an unexpected shape.
    #[error("invalid payload: {0}")]
    Payload(String),
}
