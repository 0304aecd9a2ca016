//! # Augury Core
//!
//! Core types for the Augury model-serving cache.
//!
//! This crate provides the foundational abstractions shared by every Augury component:
//! - The error taxonomy and its caller-facing classification
//! - Prediction request/response structures
//! - Identifier types
//! - Service configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{BatchPredictionRequest, PredictionRequest};
pub use response::{BatchPredictionResult, ModelInfo, PredictionMetadata, PredictionResult};
pub use types::{ModelId, Payload, RequestId};
