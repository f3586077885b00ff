//! # churn-core
//!
//! Core types, traits, and constants for the churn inference serving core.
//!
//! This crate provides:
//! - Domain types: `RawRecord`, `EncodedVector`
//! - The `Classifier` capability implemented by trained models
//! - The required-field contract and artifact location defaults
//!
//! ## Example
//!
//! ```rust
//! use churn_core::types::RawRecord;
//!
//! let mut record = RawRecord::new();
//! record.insert("Geography", "Spain");
//! record.insert("Age", 30);
//! assert!(!record.is_complete());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{Error, Result};
pub use traits::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::traits::*;
    pub use crate::types::*;
}
