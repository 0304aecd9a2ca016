//! Prediction execution against a loaded predictor.

use augury_core::{Error, Payload, Result};
use serde_json::Value;

use crate::predictor::{PredictError, Predictor};

/// Output of a single inference call, before postprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Predicted value or class label.
    pub prediction: Value,
    /// Highest class probability.
    pub confidence: Option<f64>,
    /// Probability per class.
    pub probabilities: Option<Vec<f64>>,
}

impl RawPrediction {
    /// Converts the prediction into the payload shape used by postprocessing.
    #[must_use]
    pub fn into_payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("prediction".to_string(), self.prediction);
        if let Some(confidence) = self.confidence {
            payload.insert("confidence".to_string(), Value::from(confidence));
        }
        if let Some(probabilities) = self.probabilities {
            payload.insert("probabilities".to_string(), Value::from(probabilities));
        }
        payload
    }
}

/// Runs predictors against request payloads.
pub struct Executor;

impl Executor {
    /// Builds the ordered feature vector for a payload.
    ///
    /// Fields are taken in `feature_order` when the artifact defines one,
    /// otherwise in sorted key order. Booleans count as 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::InvalidFeature`] for a missing or non-numeric field.
    pub fn feature_vector(
        input: &Payload,
        feature_order: Option<&[String]>,
    ) -> std::result::Result<Vec<f64>, PredictError> {
        let fields: Vec<&str> = match feature_order {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => {
                let mut keys: Vec<&str> = input.keys().map(String::as_str).collect();
                keys.sort_unstable();
                keys
            }
        };

        fields
            .into_iter()
            .map(|field| match input.get(field) {
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| PredictError::InvalidFeature {
                    field: field.to_string(),
                    reason: "number out of range".to_string(),
                }),
                Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
                Some(Value::Null) | None => Err(PredictError::InvalidFeature {
                    field: field.to_string(),
                    reason: "missing value".to_string(),
                }),
                Some(_) => Err(PredictError::InvalidFeature {
                    field: field.to_string(),
                    reason: "not numeric".to_string(),
                }),
            })
            .collect()
    }

    /// Runs one prediction.
    ///
    /// With `want_confidence` and a probabilistic predictor, the result also
    /// carries the class probabilities and their maximum as confidence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] wrapping any feature or computation failure.
    pub fn run(
        model_id: &str,
        predictor: &dyn Predictor,
        input: &Payload,
        feature_order: Option<&[String]>,
        want_confidence: bool,
    ) -> Result<RawPrediction> {
        let to_error = |e: PredictError| Error::inference(model_id, e.to_string());

        let features = Self::feature_vector(input, feature_order).map_err(to_error)?;
        let prediction = predictor.predict(&features).map_err(to_error)?;

        let (confidence, probabilities) = match predictor.as_probabilistic() {
            Some(probabilistic) if want_confidence => {
                let proba = probabilistic.predict_proba(&features).map_err(to_error)?;
                let confidence = proba.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (Some(confidence), Some(proba))
            }
            _ => (None, None),
        };

        tracing::trace!(
            model_id,
            framework = %predictor.framework(),
            n_features = features.len(),
            "Inference complete"
        );

        Ok(RawPrediction {
            prediction,
            confidence,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearRegressor, LogisticClassifier};
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn classifier() -> LogisticClassifier {
        LogisticClassifier {
            classes: vec![json!(0), json!(1)],
            coefficients: vec![vec![1.0, 1.0]],
            intercepts: vec![0.0],
        }
    }

    #[test]
    fn test_sorted_key_order() {
        let input = payload(json!({"b": 2, "a": 1.5, "c": true}));
        let features = Executor::feature_vector(&input, None).unwrap();
        assert_eq!(features, vec![1.5, 2.0, 1.0]);
    }

    #[test]
    fn test_explicit_feature_order() {
        let input = payload(json!({"b": 2, "a": 1, "extra": "ignored"}));
        let order = vec!["b".to_string(), "a".to_string()];
        let features = Executor::feature_vector(&input, Some(&order)).unwrap();
        assert_eq!(features, vec![2.0, 1.0]);
    }

    #[test]
    fn test_non_numeric_feature_is_inference_error() {
        let model = LinearRegressor {
            coefficients: vec![1.0],
            intercept: 0.0,
        };
        let input = payload(json!({"x": "ten"}));

        let err = Executor::run("m1", &model, &input, None, false).unwrap_err();
        assert!(matches!(err, Error::Inference { ref model_id, .. } if model_id == "m1"));
    }

    #[test]
    fn test_confidence_only_when_requested() {
        let model = classifier();
        let input = payload(json!({"f1": 2.0, "f2": 1.0}));

        let plain = Executor::run("m1", &model, &input, None, false).unwrap();
        assert_eq!(plain.prediction, json!(1));
        assert!(plain.confidence.is_none());
        assert!(plain.probabilities.is_none());

        let rich = Executor::run("m1", &model, &input, None, true).unwrap();
        let proba = rich.probabilities.clone().unwrap();
        assert_eq!(proba.len(), 2);
        assert_eq!(rich.confidence, Some(proba[1]));
    }

    #[test]
    fn test_regressor_ignores_confidence_flag() {
        let model = LinearRegressor {
            coefficients: vec![2.0],
            intercept: 1.0,
        };
        let input = payload(json!({"x": 3}));

        let raw = Executor::run("m1", &model, &input, None, true).unwrap();
        assert_eq!(raw.prediction, json!(7.0));
        assert!(raw.confidence.is_none());
    }

    #[test]
    fn test_into_payload() {
        let raw = RawPrediction {
            prediction: json!(1),
            confidence: Some(0.75),
            probabilities: Some(vec![0.25, 0.75]),
        };

        assert_eq!(
            Value::Object(raw.into_payload()),
            json!({"prediction": 1, "confidence": 0.75, "probabilities": [0.25, 0.75]})
        );
    }
}
