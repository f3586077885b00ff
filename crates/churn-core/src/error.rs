//! Error types for the churn serving core.

use thiserror::Error;

/// Core error type shared by the model and gateway crates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Artifact missing, unreadable or inconsistent
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad {
        /// Path of the artifact that failed
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// Encoded input does not match what the classifier expects
    #[error("Schema mismatch: expected {expected} features, got {actual}")]
    SchemaMismatch {
        /// Width the classifier was trained on
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },

    /// Record value that cannot be encoded
    #[error("Unsupported value for field {field}: {kind}")]
    UnsupportedValue {
        /// Field name
        field: String,
        /// JSON kind of the offending value
        kind: &'static str,
    },

    /// Classifier failed while predicting
    #[error("Model inference error: {0}")]
    ModelError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an artifact load error for `path`
    pub fn artifact(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Error::ArtifactLoad {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from loading artifacts
    #[must_use]
    pub fn is_artifact_load(&self) -> bool {
        matches!(self, Error::ArtifactLoad { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SchemaMismatch {
            expected: 13,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch: expected 13 features, got 12"
        );
    }

    #[test]
    fn test_artifact_error() {
        let err = Error::artifact("models/model.json", "No such file or directory");
        assert!(err.is_artifact_load());
        assert!(err.to_string().contains("models/model.json"));
        assert!(!Error::ModelError("boom".to_string()).is_artifact_load());
    }
}
