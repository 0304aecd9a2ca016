//! Request types for prediction operations.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Payload;

/// Request for a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Raw input fields.
    pub input_data: Payload,

    /// Include confidence and class probabilities when the model supports them.
    #[serde(default)]
    pub return_probabilities: bool,

    /// Serve from and store into the prediction result cache.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl PredictionRequest {
    /// Creates a new request for the given input.
    #[must_use]
    pub fn new(input_data: Payload) -> Self {
        Self {
            input_data,
            return_probabilities: false,
            use_cache: default_use_cache(),
        }
    }

    /// Requests confidence and probabilities.
    #[must_use]
    pub fn with_probabilities(mut self, enabled: bool) -> Self {
        self.return_probabilities = enabled;
        self
    }

    /// Enables or disables the result cache.
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Checks the request invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `input_data` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.input_data.is_empty() {
            return Err(Error::invalid_request("input_data cannot be empty"));
        }
        Ok(())
    }
}

/// Request for a batch of predictions against one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionRequest {
    /// Ordered inputs.
    pub inputs: Vec<Payload>,

    /// Include confidence and class probabilities when the model supports them.
    #[serde(default)]
    pub return_probabilities: bool,

    /// Serve from and store into the prediction result cache.
    #[serde(default)]
    pub use_cache: bool,
}

impl BatchPredictionRequest {
    /// Creates a new batch request.
    #[must_use]
    pub fn new(inputs: Vec<Payload>) -> Self {
        Self {
            inputs,
            return_probabilities: false,
            use_cache: false,
        }
    }

    /// Requests confidence and probabilities.
    #[must_use]
    pub fn with_probabilities(mut self, enabled: bool) -> Self {
        self.return_probabilities = enabled;
        self
    }

    /// Enables or disables the result cache.
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Returns the number of inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Returns true if the batch has no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Checks the batch invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the batch is empty, larger than
    /// `max_batch_size`, or contains an empty input.
    pub fn validate(&self, max_batch_size: usize) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::invalid_request("inputs cannot be empty"));
        }
        if self.inputs.len() > max_batch_size {
            return Err(Error::invalid_request(format!(
                "batch size {} exceeds maximum of {}",
                self.inputs.len(),
                max_batch_size
            )));
        }
        if let Some(idx) = self.inputs.iter().position(Payload::is_empty) {
            return Err(Error::invalid_request(format!("input {idx} is empty")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: PredictionRequest =
            serde_json::from_value(json!({"input_data": {"f1": 1.5}})).unwrap();

        assert!(req.use_cache);
        assert!(!req.return_probabilities);

        let batch: BatchPredictionRequest =
            serde_json::from_value(json!({"inputs": [{"f1": 1.5}]})).unwrap();
        assert!(!batch.use_cache);
    }

    #[test]
    fn test_empty_input_rejected() {
        let req = PredictionRequest::new(Payload::new());
        assert!(matches!(req.validate(), Err(Error::InvalidRequest { .. })));
    }

    #[test]
    fn test_batch_bounds() {
        let one = payload(json!({"f1": 1}));

        assert!(BatchPredictionRequest::new(vec![]).validate(10).is_err());
        assert!(BatchPredictionRequest::new(vec![one.clone(); 3]).validate(3).is_ok());
        assert!(BatchPredictionRequest::new(vec![one.clone(); 4]).validate(3).is_err());
        assert!(BatchPredictionRequest::new(vec![one, Payload::new()])
            .validate(10)
            .is_err());
    }
}
