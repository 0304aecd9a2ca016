//! Supported model frameworks.

mod forest;
mod linear;
mod logistic;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use linear::LinearRegressor;
pub use logistic::LogisticClassifier;

use crate::predictor::{Framework, PredictError, Predictor};

/// Serialized model parameters, tagged by framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "framework", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Linear regression parameters.
    LinearRegression(LinearRegressor),
    /// Logistic regression parameters.
    LogisticRegression(LogisticClassifier),
    /// Random forest parameters.
    RandomForest(ForestClassifier),
}

impl ModelSpec {
    /// Returns the framework tag.
    #[must_use]
    pub fn framework(&self) -> Framework {
        match self {
            Self::LinearRegression(_) => Framework::LinearRegression,
            Self::LogisticRegression(_) => Framework::LogisticRegression,
            Self::RandomForest(_) => Framework::RandomForest,
        }
    }

    /// Validates the parameters and wraps them as a shared predictor.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Malformed`] if the parameters are inconsistent.
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>, PredictError> {
        Ok(match self {
            Self::LinearRegression(model) => {
                model.validate()?;
                Arc::new(model)
            }
            Self::LogisticRegression(model) => {
                model.validate()?;
                Arc::new(model)
            }
            Self::RandomForest(model) => {
                model.validate()?;
                Arc::new(model)
            }
        })
    }
}
