//! # churn-model
//!
//! Schema-aligned feature encoding and cached classifier inference.
//!
//! This crate provides:
//! - Artifact location (environment override, configured path, deployment default)
//! - The ordered feature-schema manifest
//! - One-hot feature encoding aligned to the manifest
//! - A logistic classifier and the process-wide predictor cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use churn_model::prelude::*;
//!
//! let cache = PredictorCache::from_locator(ArtifactLocator::default());
//! let prediction = cache.predict_record(&record).await?;
//! println!("{}", prediction.label_text());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifacts;
pub mod cache;
pub mod encoder;
pub mod inference;
pub mod manifest;

pub use artifacts::{ArtifactLocator, ArtifactPaths};
pub use cache::{ArtifactSource, FsArtifactSource, LoadedModel, PredictorCache};
pub use encoder::{encode, encode_with_report, Encoding, FeatureEncoder};
pub use inference::{LogisticModel, Prediction};
pub use manifest::Manifest;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactLocator, ArtifactPaths};
    pub use crate::cache::{ArtifactSource, FsArtifactSource, LoadedModel, PredictorCache};
    pub use crate::encoder::{encode, Encoding, FeatureEncoder};
    pub use crate::inference::{LogisticModel, Prediction};
    pub use crate::manifest::Manifest;
}
