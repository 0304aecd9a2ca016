//! Error types for the Augury model-serving cache.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Augury.
#[derive(Error, Debug)]
pub enum Error {
    /// Model could not be resolved by the registry.
    #[error("Model not found: {model_id}")]
    ModelNotFound {
        /// The requested model identifier.
        model_id: String,
    },

    /// The artifact source holds no artifact for the identifier.
    #[error("No artifact available for model: {model_id}")]
    ArtifactUnavailable {
        /// The requested model identifier.
        model_id: String,
    },

    /// Artifact bytes could not be turned into a usable predictor.
    #[error("Failed to deserialize model {model_id}: {message}")]
    Deserialization {
        /// The model identifier.
        model_id: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// The predictor failed while computing a prediction.
    #[error("Inference failed for model {model_id}: {message}")]
    Inference {
        /// The model identifier.
        model_id: String,
        /// Description of the computation failure.
        message: String,
    },

    /// The request violates an input invariant.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the violation.
        message: String,
    },

    /// Operation timed out.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// Duration before timeout.
        duration: Duration,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

/// Caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model does not exist.
    NotFound,
    /// The request was malformed.
    InvalidRequest,
    /// The inference deadline expired.
    Timeout,
    /// Anything else; details stay server-side.
    Internal,
}

impl Error {
    /// Classifies the error for the surrounding API layer.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound { .. } | Self::ArtifactUnavailable { .. } => ErrorKind::NotFound,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Timeout { .. } => ErrorKind::Timeout,
            _ => ErrorKind::Internal,
        }
    }

    /// Returns `true` if the model identifier could not be resolved.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns the message that is safe to show to API callers.
    ///
    /// Internal failures collapse to a generic message so that artifact and
    /// predictor details never leak.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::NotFound => "Model not found".to_string(),
            ErrorKind::InvalidRequest => self.to_string(),
            ErrorKind::Timeout => "Prediction timed out".to_string(),
            ErrorKind::Internal => "Prediction failed".to_string(),
        }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a deserialization error for a model artifact.
    #[must_use]
    pub fn deserialization(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deserialization {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Creates an inference error.
    #[must_use]
    pub fn inference(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inference {
            model_id: model_id.into(),
            message: message.into(),
        }
    }
}
