//! # churn-gateway
//!
//! Entry points for churn prediction: serverless handler, HTTP server and
//! the scenario harness.
//!
//! This crate provides:
//! - Event normalization (direct, wrapped string, wrapped object)
//! - Response envelopes with sanitized internal failures
//! - The serverless handler and the axum `POST /predict` route
//! - Prometheus metrics export
//! - Configuration management

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod handler;
pub mod metrics;
pub mod normalizer;
pub mod response;
pub mod server;

pub use config::AppConfig;
pub use handler::{ChurnHandler, InvocationContext};
pub use metrics::MetricsRegistry;
pub use normalizer::{normalize, EventShape, NormalizeError};
pub use response::{ErrorCode, LambdaResponse, PredictionResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::handler::{ChurnHandler, InvocationContext};
    pub use crate::metrics::MetricsRegistry;
    pub use crate::normalizer::{normalize, EventShape, NormalizeError};
    pub use crate::response::{ErrorCode, LambdaResponse, PredictionResult};
    pub use crate::server::{AppStatus, ServerState};
}
