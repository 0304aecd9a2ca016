//! The serialized artifact envelope.

use augury_core::{Error, Payload, Result};
use orobas::models::{DecisionTree, TreeNode};
use orobas::{ForestClassifier, ModelSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// File extension used for stored artifacts.
pub const ARTIFACT_EXTENSION: &str = "json";

/// A model artifact: predictor parameters plus serving configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// Input field order; sorted key order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_order: Option<Vec<String>>,
    /// Preprocessing options.
    #[serde(default)]
    pub preprocessing: Payload,
    /// Postprocessing options.
    #[serde(default)]
    pub postprocessing: Payload,
    /// Predictor parameters, tagged by framework.
    pub model: ModelSpec,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl ModelArtifact {
    /// Decodes an artifact from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialization`] if the bytes are not a valid envelope.
    pub fn from_slice(model_id: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::deserialization(model_id, e.to_string()))
    }
}

/// Encodes an artifact as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails.
pub fn encode_artifact(artifact: &ModelArtifact) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(artifact)?)
}

fn stump(feature: usize, threshold: f64, low: [f64; 2], high: [f64; 2]) -> DecisionTree {
    DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf {
                value: low.to_vec(),
            },
            TreeNode::Leaf {
                value: high.to_vec(),
            },
        ],
    }
}

/// Builds the demo classifier served when no real artifact exists.
///
/// The model is a small random forest over `feature_1`..`feature_4` with
/// binary labels mapped to `negative` and `positive`. It is identical for
/// every identifier.
#[must_use]
pub fn demo_artifact(model_id: &str) -> ModelArtifact {
    tracing::debug!(model_id, "Building demo artifact");

    let forest = ForestClassifier {
        classes: vec![json!(0), json!(1)],
        n_features: 4,
        trees: vec![
            stump(0, 0.0, [42.0, 8.0], [9.0, 41.0]),
            stump(1, 0.5, [35.0, 15.0], [12.0, 38.0]),
            stump(2, -0.25, [30.0, 20.0], [18.0, 32.0]),
            stump(3, 0.0, [27.0, 23.0], [21.0, 29.0]),
        ],
    };

    let mut preprocessing = Payload::new();
    preprocessing.insert("fill_na".to_string(), Value::Bool(true));
    preprocessing.insert("fill_value".to_string(), json!(0.0));

    let mut postprocessing = Payload::new();
    postprocessing.insert(
        "class_mapping".to_string(),
        json!({"0": "negative", "1": "positive"}),
    );
    postprocessing.insert("confidence_threshold".to_string(), json!(0.6));

    ModelArtifact {
        version: "1.0.0-demo".to_string(),
        feature_order: Some((1..=4).map(|i| format!("feature_{i}")).collect()),
        preprocessing,
        postprocessing,
        model: ModelSpec::RandomForest(forest),
    }
}
