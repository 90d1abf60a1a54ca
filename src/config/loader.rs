//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/promptshelf/config.toml)
//! 3. Project config (.promptshelf/config.toml)
//! 4. Environment variables (PROMPTSHELF_* prefix, `__` between sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ShelfError};

/// Project data directory name
pub const PROJECT_DIR: &str = ".promptshelf";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_with_project_dir(&Self::project_dir())
    }

    /// Same as [`ConfigLoader::load`] with an explicit project data dir
    pub fn load_with_project_dir(project_dir: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = project_dir.join("config.toml");
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // PROMPTSHELF_INFERENCE__TIMEOUT_SECS -> inference.timeout_secs
        figment = figment.merge(Env::prefixed("PROMPTSHELF_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ShelfError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ShelfError::Config(format!("Configuration error: {}", e)))
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/promptshelf/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("promptshelf"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(PROJECT_DIR)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ShelfError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    /// Edit config file with default editor
    pub fn edit_config(global: bool) -> Result<()> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                ShelfError::Config("Cannot determine global config path".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if !path.exists() {
            println!("Config file does not exist: {}", path.display());
            println!(
                "Run: promptshelf config init {}",
                if global { "--global" } else { "" }
            );
            return Ok(());
        }

        let editor = env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        });

        let status = Command::new(&editor).arg(&path).status().map_err(|e| {
            ShelfError::Config(format!("Failed to launch editor {}: {}", editor, e))
        })?;

        if !status.success() {
            return Err(ShelfError::Config("Editor exited with error".to_string()));
        }

        println!("Config saved: {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ShelfError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(global_dir)
    }

    /// Initialize project configuration under `project_dir`
    pub fn init_project(project_dir: &Path, viewer_id: &str) -> Result<PathBuf> {
        fs::create_dir_all(project_dir)?;
        fs::create_dir_all(project_dir.join(crate::constants::progress::DEFAULT_DIR))?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, Self::default_project_config(viewer_id))?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir.to_path_buf())
    }

    /// Check if project is initialized
    pub fn is_project_initialized() -> bool {
        Self::project_dir().exists()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# promptshelf Global Configuration
# User-wide defaults. Project settings in .promptshelf/config.toml override these.

version = "1.0"

# Prompt execution endpoint (leave unset to disable `promptshelf exec`)
[inference]
# endpoint = "https://api-inference.example.com/models/my-model"
timeout_secs = 120
retry_delay_secs = 20
max_new_tokens = 512
"#
        .to_string()
    }

    fn default_project_config(viewer_id: &str) -> String {
        format!(
            r#"# promptshelf Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[viewer]
id = "{}"
is_admin = false

[storage]
database = "catalog.db"
progress_dir = "progress"
"#,
            viewer_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_with_project_dir(temp_dir.path()).unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_init_project_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let project_dir = temp_dir.path().join(PROJECT_DIR);

        ConfigLoader::init_project(&project_dir, "tester").unwrap();

        assert!(project_dir.join("config.toml").exists());
        assert!(project_dir.join("progress").exists());

        let config = ConfigLoader::load_with_project_dir(&project_dir).unwrap();
        assert_eq!(config.viewer.id, "tester");
        assert!(!config.viewer.is_admin);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[inference]\nmax_new_tokens = 64\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.inference.max_new_tokens, 64);
        assert_eq!(config.inference.timeout_secs, 120);
    }

    #[test]
    fn test_env_override() {
        let temp_dir = TempDir::new().unwrap();
        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("PROMPTSHELF_INFERENCE__MODEL", "test-model");
        }
        let config = ConfigLoader::load_with_project_dir(temp_dir.path()).unwrap();
        assert_eq!(config.inference.model.as_deref(), Some("test-model"));
        unsafe {
            std::env::remove_var("PROMPTSHELF_INFERENCE__MODEL");
        }
    }
}
