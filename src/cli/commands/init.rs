//! Init Command
//!
//! Initialize promptshelf in the current directory.

use std::path::Path;

use crate::cli::util::create_catalog_db;
use crate::config::{ConfigLoader, PROJECT_DIR, ViewerConfig};
use crate::types::{Result, ShelfError};

pub fn run(force: bool) -> Result<()> {
    let project_dir = Path::new(PROJECT_DIR);

    if project_dir.exists() && !force {
        return Err(ShelfError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let viewer = ViewerConfig::default();
    ConfigLoader::init_project(project_dir, &viewer.id)?;

    // Global config is optional; never overwrite it here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let config = ConfigLoader::load_with_project_dir(project_dir)?;
    create_catalog_db(project_dir, &config)?;

    println!("✓ Initialized promptshelf in {}/", PROJECT_DIR);
    println!("  Viewer: {}", config.viewer.id);
    println!();
    println!("Next steps:");
    println!("  1. Run 'promptshelf import <chain.yaml>' to add a chain");
    println!("  2. Run 'promptshelf run <slug>' to start working through it");

    Ok(())
}
