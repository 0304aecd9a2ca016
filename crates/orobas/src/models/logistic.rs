//! Logistic regression classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predictor::{
    argmax, check_dimensions, Framework, PredictError, Predictor, ProbabilisticPredictor,
};

/// Logistic regression over two or more classes.
///
/// A binary model may carry a single coefficient row, in which case the row
/// scores the second class against the first. Otherwise there is one row per
/// class and probabilities come from a softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    /// Class labels.
    pub classes: Vec<Value>,
    /// Coefficient rows.
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per coefficient row.
    pub intercepts: Vec<f64>,
}

impl LogisticClassifier {
    pub(crate) fn validate(&self) -> Result<(), PredictError> {
        if self.classes.len() < 2 {
            return Err(PredictError::Malformed(
                "logistic regression needs at least two classes".to_string(),
            ));
        }
        let binary_row = self.classes.len() == 2 && self.coefficients.len() == 1;
        if !binary_row && self.coefficients.len() != self.classes.len() {
            return Err(PredictError::Malformed(format!(
                "{} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            )));
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err(PredictError::Malformed(format!(
                "{} intercepts for {} coefficient rows",
                self.intercepts.len(),
                self.coefficients.len()
            )));
        }
        let width = self.coefficients[0].len();
        if width == 0 || self.coefficients.iter().any(|row| row.len() != width) {
            return Err(PredictError::Malformed(
                "coefficient rows must be non-empty and equally sized".to_string(),
            ));
        }
        Ok(())
    }

    fn scores(&self, features: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Predictor for LogisticClassifier {
    fn framework(&self) -> Framework {
        Framework::LogisticRegression
    }

    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn predict(&self, features: &[f64]) -> Result<Value, PredictError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)].clone())
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticPredictor> {
        Some(self)
    }
}

impl ProbabilisticPredictor for LogisticClassifier {
    fn classes(&self) -> &[Value] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_dimensions(self.n_features(), features)?;
        let scores = self.scores(features);

        let proba = if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&scores)
        };

        if proba.iter().all(|p| p.is_finite()) {
            Ok(proba)
        } else {
            Err(PredictError::NonFinite)
        }
    }
}
