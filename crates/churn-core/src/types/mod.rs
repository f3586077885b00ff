//! Core domain types for the serving core.

mod record;

pub use record::RawRecord;

/// Numeric feature vector positionally aligned to a schema manifest
pub type EncodedVector = Vec<f64>;
