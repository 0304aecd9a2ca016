//! Predictor capability traits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Model framework tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Ordinary least squares regression.
    LinearRegression,
    /// Binary or multinomial logistic regression.
    LogisticRegression,
    /// Ensemble of decision trees.
    RandomForest,
}

impl Framework {
    /// Returns the wire name of the framework.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinearRegression => "linear_regression",
            Self::LogisticRegression => "logistic_regression",
            Self::RandomForest => "random_forest",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure inside a predictor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Feature vector has the wrong length.
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Features the model was trained on.
        expected: usize,
        /// Features supplied.
        actual: usize,
    },

    /// The computation produced NaN or infinity.
    #[error("model produced a non-finite value")]
    NonFinite,

    /// An input field is missing or not numeric.
    #[error("invalid feature '{field}': {reason}")]
    InvalidFeature {
        /// Field name.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Model parameters are inconsistent.
    #[error("malformed model: {0}")]
    Malformed(String),
}

/// A loaded, invocable model.
///
/// Implementations are immutable after construction so a single instance can
/// serve concurrent requests and outlive its registry slot.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    /// Returns the framework that produced this predictor.
    fn framework(&self) -> Framework;

    /// Returns the number of features the predictor expects.
    fn n_features(&self) -> usize;

    /// Predicts a single value from an ordered feature vector.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatch or a non-finite result.
    fn predict(&self, features: &[f64]) -> Result<Value, PredictError>;

    /// Returns the probabilistic facet if the model supports it.
    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticPredictor> {
        None
    }
}

/// A predictor that can report a probability per class.
pub trait ProbabilisticPredictor: Predictor {
    /// Returns the class labels, aligned with [`Self::predict_proba`].
    fn classes(&self) -> &[Value];

    /// Computes class probabilities for an ordered feature vector.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatch or a non-finite result.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictError>;
}

/// Checks the feature vector length against the model.
pub(crate) fn check_dimensions(expected: usize, features: &[f64]) -> Result<(), PredictError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(PredictError::DimensionMismatch {
            expected,
            actual: features.len(),
        })
    }
}

/// Returns the index of the maximum value, first index on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Converts a float into a JSON number.
pub(crate) fn finite_value(x: f64) -> Result<Value, PredictError> {
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .ok_or(PredictError::NonFinite)
}
