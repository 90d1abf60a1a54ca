//! Config Command
//!
//! Manage promptshelf configuration.
//!
//! Usage:
//!   promptshelf config show [-g] [-f json]
//!   promptshelf config path
//!   promptshelf config edit [-g]
//!   promptshelf config init [-g] [--force]

use std::path::Path;

use crate::config::{ConfigLoader, PROJECT_DIR, ViewerConfig};
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    if global {
        if let Some(global_path) = ConfigLoader::global_config_path() {
            if global_path.exists() {
                let content = std::fs::read_to_string(&global_path)?;
                if format == "toml" {
                    println!("{}", content);
                } else {
                    println!("# Global Config: {}\n", global_path.display());
                    println!("{}", content);
                }
            } else {
                println!("No global config found.");
                println!("Run 'promptshelf config init --global' to create one.");
            }
        } else {
            println!("Cannot determine global config directory.");
        }
    } else {
        // Merged effective config
        ConfigLoader::show_config(format == "json")?;
    }
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn edit(global: bool) -> Result<()> {
    ConfigLoader::edit_config(global)
}

pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Directory: {}", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        println!("  Config:    {}", config_path.display());
    }
    Ok(())
}

pub fn init_project() -> Result<()> {
    let viewer = ViewerConfig::default();
    let dir = ConfigLoader::init_project(Path::new(PROJECT_DIR), &viewer.id)?;
    println!("✓ Initialized project configuration");
    println!("  Directory: {}", dir.display());
    println!(
        "  Config:    {}",
        ConfigLoader::project_config_path().display()
    );
    Ok(())
}
