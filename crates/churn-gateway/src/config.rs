//! Application configuration.

use std::path::PathBuf;

use churn_core::constants::CONFIG_PATH_ENV;
use churn_model::artifacts::ArtifactLocator;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name
    pub name: String,
    /// Log level
    pub log_level: String,
    /// HTTP listener configuration
    pub http: HttpConfig,
    /// Artifact locations
    pub artifacts: ArtifactConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "churn-gateway".to_string(),
            log_level: "info".to_string(),
            http: HttpConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Artifact locations. Environment overrides still win over these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Classifier artifact path
    pub model_path: Option<PathBuf>,
    /// Manifest artifact path
    pub manifest_path: Option<PathBuf>,
    /// Directory whose presence marks a packaged deployment
    pub deployment_marker: PathBuf,
    /// Artifact directory for packaged deployments
    pub packaged_dir: PathBuf,
    /// Artifact directory for local runs
    pub local_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        let locator = ArtifactLocator::default();
        Self {
            model_path: locator.model_path,
            manifest_path: locator.manifest_path,
            deployment_marker: locator.deployment_marker,
            packaged_dir: locator.packaged_dir,
            local_dir: locator.local_dir,
        }
    }
}

impl ArtifactConfig {
    /// Build the artifact locator
    #[must_use]
    pub fn locator(&self) -> ArtifactLocator {
        ArtifactLocator {
            model_path: self.model_path.clone(),
            manifest_path: self.manifest_path.clone(),
            deployment_marker: self.deployment_marker.clone(),
            packaged_dir: self.packaged_dir.clone(),
            local_dir: self.local_dir.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the file named by `CHURN_CONFIG`, or defaults
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Socket address string for the HTTP listener
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}
