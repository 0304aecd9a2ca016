//! Linear regression.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predictor::{check_dimensions, finite_value, Framework, PredictError, Predictor};

/// Ordinary least squares regressor: `y = w·x + b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    /// One weight per feature.
    pub coefficients: Vec<f64>,
    /// Bias term.
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegressor {
    pub(crate) fn validate(&self) -> Result<(), PredictError> {
        if self.coefficients.is_empty() {
            return Err(PredictError::Malformed(
                "linear regression needs at least one coefficient".to_string(),
            ));
        }
        if !self.coefficients.iter().all(|w| w.is_finite()) || !self.intercept.is_finite() {
            return Err(PredictError::Malformed(
                "linear regression parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Predictor for LinearRegressor {
    fn framework(&self) -> Framework {
        Framework::LinearRegression
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<Value, PredictError> {
        check_dimensions(self.coefficients.len(), features)?;
        let y = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        finite_value(y)
    }
}
