//! # Orobas
//!
//! *"The Oracle answers truly of things past, present and to come"*
//!
//! Orobas holds the predictor abstraction for Augury and the executor that
//! turns a request payload into a prediction.
//!
//! ## Features
//!
//! - **Capability Traits**: `Predictor` for every model, `ProbabilisticPredictor`
//!   for models that can report class probabilities
//! - **Framework Variants**: linear regression, logistic regression and random forests
//! - **Executor**: stable feature ordering, confidence extraction, uniform errors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod executor;
pub mod models;
pub mod predictor;

pub use executor::{Executor, RawPrediction};
pub use models::{ForestClassifier, LinearRegressor, LogisticClassifier, ModelSpec};
pub use predictor::{Framework, PredictError, Predictor, ProbabilisticPredictor};
