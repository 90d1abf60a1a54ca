//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/promptshelf/) and project (.promptshelf/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{catalog, inference, progress};
use crate::types::{Result, ShelfError, Viewer};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Identity used for ownership and purchase checks
    pub viewer: ViewerConfig,

    /// Catalog and progress locations
    pub storage: StorageConfig,

    /// Prompt execution endpoint
    pub inference: InferenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            viewer: ViewerConfig::default(),
            storage: StorageConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ShelfError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.viewer.id.trim().is_empty() {
            return Err(ShelfError::Config("viewer.id must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(ShelfError::Config(format!(
                "inference temperature must be between 0.0 and 2.0, got {}",
                self.inference.temperature
            )));
        }

        if self.inference.timeout_secs == 0 {
            return Err(ShelfError::Config(
                "inference timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(endpoint) = &self.inference.endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                ShelfError::Config(format!("invalid inference endpoint '{}': {}", endpoint, e))
            })?;
        }

        Ok(())
    }

    /// Viewer identity for access checks
    pub fn viewer(&self) -> Viewer {
        Viewer {
            id: self.viewer.id.clone().into(),
            is_admin: self.viewer.is_admin,
        }
    }
}

// =============================================================================
// Viewer Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Viewer id (defaults to the OS user name)
    pub id: String,

    /// Admins may delete any chain
    pub is_admin: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let id = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "local".to_string());
        Self {
            id,
            is_admin: false,
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Catalog database file, relative to the project data dir
    pub database: PathBuf,

    /// Progress record directory, relative to the project data dir
    pub progress_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(catalog::DEFAULT_DATABASE),
            progress_dir: PathBuf::from(progress::DEFAULT_DIR),
        }
    }
}

// =============================================================================
// Inference Configuration
// =============================================================================

/// Note: the API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Full endpoint URL; running prompts is disabled when unset
    pub endpoint: Option<String>,

    /// Model name sent for display and logging
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Wait before retrying a request that hit a loading model
    pub retry_delay_secs: u64,

    pub max_new_tokens: u32,

    pub temperature: f32,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            timeout_secs: inference::DEFAULT_TIMEOUT_SECS,
            retry_delay_secs: inference::DEFAULT_LOADING_RETRY_SECS,
            max_new_tokens: inference::DEFAULT_MAX_NEW_TOKENS,
            temperature: 0.7,
            api_key: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.storage.database, PathBuf::from("catalog.db"));
        assert!(config.inference.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.inference.endpoint = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ShelfError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let mut config = Config::default();
        config.inference.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_and_not_serialized() {
        let mut config = InferenceConfig::default();
        config.api_key = Some("secret-key".to_string());

        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-key"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
    }

    #[test]
    fn test_viewer_from_config() {
        let mut config = Config::default();
        config.viewer.id = "alice".to_string();
        config.viewer.is_admin = true;
        let viewer = config.viewer();
        assert_eq!(viewer.id.as_str(), "alice");
        assert!(viewer.is_admin);
    }
}
