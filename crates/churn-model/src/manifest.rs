//! Ordered feature-schema manifest.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use churn_core::error::{Error, Result};

use crate::artifacts::read_artifact;

/// Ordered, unique encoded column names learned at training time.
///
/// Cloning is cheap and the column list can never be mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    columns: Arc<[String]>,
}

impl Manifest {
    /// Build a manifest, rejecting empty or duplicated column lists
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::ConfigError("manifest has no columns".to_string()));
        }

        {
            let mut seen = HashSet::with_capacity(columns.len());
            if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(Error::ConfigError(format!("duplicate manifest column {dup}")));
            }
        }

        Ok(Self {
            columns: columns.into(),
        })
    }

    /// Load a manifest artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let columns: Vec<String> = read_artifact(path)?;
        Self::new(columns).map_err(|e| Error::artifact(path, e))
    }

    /// Column names in positional order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a constructed manifest
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterate over column names
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.columns.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::write_artifact;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_manifest_order_preserved() {
        let manifest = Manifest::new(cols(&["Age", "Geography_France", "Gender_Male"])).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.position("Geography_France"), Some(1));
        assert_eq!(manifest.position("Geography_Spain"), None);
        assert_eq!(
            manifest.iter().collect::<Vec<_>>(),
            vec!["Age", "Geography_France", "Gender_Male"]
        );
        assert_eq!(manifest.iter().len(), 3);
        assert_eq!(manifest.iter().next_back(), Some("Gender_Male"));
    }

    #[test]
    fn test_manifest_rejects_duplicates() {
        let err = Manifest::new(cols(&["Age", "Tenure", "Age"])).unwrap_err();
        assert!(err.to_string().contains("duplicate manifest column Age"));
    }

    #[test]
    fn test_manifest_rejects_empty() {
        assert!(Manifest::new(Vec::new()).is_err());
    }

    #[test]
    fn test_load_json_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_columns.json");
        std::fs::write(&path, r#"["Age","Balance","Gender_Female"]"#).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.columns(), cols(&["Age", "Balance", "Gender_Female"]).as_slice());
    }

    #[test]
    fn test_load_invalid_manifest_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_columns.json");
        std::fs::write(&path, r#"["Age","Age"]"#).unwrap();
        assert!(Manifest::load(&path).unwrap_err().is_artifact_load());

        std::fs::write(&path, "not json").unwrap();
        assert!(Manifest::load(&path).unwrap_err().is_artifact_load());

        let missing = dir.path().join("absent.json");
        assert!(Manifest::load(missing).unwrap_err().is_artifact_load());
    }

    #[test]
    fn test_load_bincode_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_columns.bin");
        write_artifact(&path, &cols(&["Age", "Tenure"])).unwrap();
        assert_eq!(Manifest::load(&path).unwrap().len(), 2);
    }
}
