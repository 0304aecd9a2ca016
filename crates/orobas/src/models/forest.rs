//! Random forest classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::predictor::{
    argmax, check_dimensions, Framework, PredictError, Predictor, ProbabilisticPredictor,
};

/// A node in a flattened decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node: go left when `x[feature] <= threshold`.
    Split {
        /// Feature index.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Index of the left child.
        left: usize,
        /// Index of the right child.
        right: usize,
    },
    /// Terminal node holding per-class weights (sample counts or fractions).
    Leaf {
        /// One weight per class.
        value: Vec<f64>,
    },
}

/// A decision tree stored as a node array rooted at index 0.
///
/// Children always sit at a higher index than their parent, which rules out
/// cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Nodes in topological order.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), PredictError> {
        if self.nodes.is_empty() {
            return Err(PredictError::Malformed("tree has no nodes".to_string()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(PredictError::Malformed(format!(
                            "node {idx} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(PredictError::Malformed(format!(
                            "node {idx} has a non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(PredictError::Malformed(format!(
                                "node {idx} points at invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(PredictError::Malformed(format!(
                            "leaf {idx} has {} weights for {n_classes} classes",
                            value.len()
                        )));
                    }
                    let total: f64 = value.iter().sum();
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0)
                        || !total.is_finite()
                        || total <= 0.0
                    {
                        return Err(PredictError::Malformed(format!(
                            "leaf {idx} weights must be non-negative with a positive sum"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the normalized class distribution of the leaf reached by `features`.
    fn distribution(&self, features: &[f64]) -> Vec<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return value.iter().map(|w| w / total).collect();
                }
            }
        }
    }
}

/// Ensemble of decision trees averaging their leaf distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    /// Class labels.
    pub classes: Vec<Value>,
    /// Number of input features.
    pub n_features: usize,
    /// Member trees.
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub(crate) fn validate(&self) -> Result<(), PredictError> {
        if self.classes.len() < 2 {
            return Err(PredictError::Malformed(
                "random forest needs at least two classes".to_string(),
            ));
        }
        if self.n_features == 0 {
            return Err(PredictError::Malformed(
                "random forest needs at least one feature".to_string(),
            ));
        }
        if self.trees.is_empty() {
            return Err(PredictError::Malformed("random forest has no trees".to_string()));
        }
        for tree in &self.trees {
            tree.validate(self.n_features, self.classes.len())?;
        }
        Ok(())
    }
}

impl Predictor for ForestClassifier {
    fn framework(&self) -> Framework {
        Framework::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<Value, PredictError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)].clone())
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticPredictor> {
        Some(self)
    }
}

impl ProbabilisticPredictor for ForestClassifier {
    fn classes(&self) -> &[Value] {
        &self.classes
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_dimensions(self.n_features, features)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.distribution(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);

        // An overflowing leaf sum normalizes to all zeros.
        if proba.iter().all(|p| p.is_finite()) && proba.iter().sum::<f64>() > 0.0 {
            Ok(proba)
        } else {
            Err(PredictError::NonFinite)
        }
    }
}
