//! Artifact location and deserialization.
//!
//! Both artifacts (classifier and manifest) are resolved independently:
//! environment override, then explicit configured path, then the deployment
//! default. The deployment default depends on whether the deployment marker
//! directory exists.

use std::path::{Path, PathBuf};

use churn_core::constants::{
    DEFAULT_DEPLOYMENT_MARKER, DEFAULT_LOCAL_DIR, DEFAULT_PACKAGED_DIR, MANIFEST_FILE_NAME,
    MANIFEST_PATH_ENV, MODEL_FILE_NAME, MODEL_PATH_ENV,
};
use churn_core::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Where artifacts are looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactLocator {
    /// Explicit classifier path (beats deployment defaults, loses to env)
    pub model_path: Option<PathBuf>,
    /// Explicit manifest path (beats deployment defaults, loses to env)
    pub manifest_path: Option<PathBuf>,
    /// Directory whose presence selects the packaged defaults
    pub deployment_marker: PathBuf,
    /// Artifact directory for packaged deployments
    pub packaged_dir: PathBuf,
    /// Artifact directory for local runs
    pub local_dir: PathBuf,
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self {
            model_path: None,
            manifest_path: None,
            deployment_marker: PathBuf::from(DEFAULT_DEPLOYMENT_MARKER),
            packaged_dir: PathBuf::from(DEFAULT_PACKAGED_DIR),
            local_dir: PathBuf::from(DEFAULT_LOCAL_DIR),
        }
    }
}

/// Deployment flavour selected by probing the marker directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    /// Packaged/serverless bundle
    Packaged,
    /// Local checkout
    Local,
}

/// Fully resolved artifact paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Classifier artifact
    pub model: PathBuf,
    /// Manifest artifact
    pub manifest: PathBuf,
}

impl ArtifactLocator {
    /// Locator with fixed paths for both artifacts
    #[must_use]
    pub fn with_paths(model: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(model.into()),
            manifest_path: Some(manifest.into()),
            ..Self::default()
        }
    }

    /// Probe the filesystem for the deployment marker
    #[must_use]
    pub fn deployment(&self) -> Deployment {
        if self.deployment_marker.is_dir() {
            Deployment::Packaged
        } else {
            Deployment::Local
        }
    }

    /// Resolve against the process environment and filesystem
    #[must_use]
    pub fn resolve(&self) -> ArtifactPaths {
        self.resolve_with(|key| std::env::var(key).ok(), self.deployment())
    }

    /// Resolve with an explicit environment lookup and deployment flavour
    pub fn resolve_with<F>(&self, env: F, deployment: Deployment) -> ArtifactPaths
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_dir = match deployment {
            Deployment::Packaged => &self.packaged_dir,
            Deployment::Local => &self.local_dir,
        };

        let pick = |env_key: &str, configured: &Option<PathBuf>, file_name: &str| {
            env(env_key)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .or_else(|| configured.clone())
                .unwrap_or_else(|| default_dir.join(file_name))
        };

        ArtifactPaths {
            model: pick(MODEL_PATH_ENV, &self.model_path, MODEL_FILE_NAME),
            manifest: pick(MANIFEST_PATH_ENV, &self.manifest_path, MANIFEST_FILE_NAME),
        }
    }
}

/// Artifact encoding, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// `serde_json`
    Json,
    /// `bincode`
    Bincode,
}

impl ArtifactFormat {
    /// `.bin` is bincode, anything else is JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") => ArtifactFormat::Bincode,
            _ => ArtifactFormat::Json,
        }
    }
}

/// Read and deserialize an artifact.
///
/// Every failure is reported as [`Error::ArtifactLoad`] naming the path.
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| Error::artifact(path, e))?;
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => serde_json::from_slice(&bytes).map_err(|e| Error::artifact(path, e)),
        ArtifactFormat::Bincode => bincode::deserialize(&bytes).map_err(|e| Error::artifact(path, e)),
    }
}

/// Serialize an artifact in the format implied by `path`
pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => serde_json::to_vec_pretty(value)?,
        ArtifactFormat::Bincode => bincode::serialize(value)?,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}
