//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ConfigLoader, PROJECT_DIR};
use crate::storage::{Catalog, Database, FileProgressStore, SharedDatabase};
use crate::types::{Result, ShelfError, Viewer};

/// Command execution context
///
/// Created via `CommandContext::load()` for commands that touch the catalog.
#[derive(Clone)]
pub struct CommandContext {
    /// Project data directory (.promptshelf)
    pub project_dir: PathBuf,
    /// Shared database handle
    pub db: SharedDatabase,
    /// Loaded configuration
    pub config: Config,
    /// Viewer identity from configuration
    pub viewer: Viewer,
}

impl CommandContext {
    /// Validates initialization, loads config, and opens the catalog.
    pub fn load() -> Result<Self> {
        let project_dir = require_initialized()?;
        let config = ConfigLoader::load_with_project_dir(&project_dir)?;
        let db = open_catalog_db(&project_dir, &config)?;

        Ok(Self {
            viewer: config.viewer(),
            project_dir,
            db: Arc::new(db),
            config,
        })
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.db)
    }

    pub fn progress_store(&self) -> FileProgressStore {
        FileProgressStore::new(resolve_path(
            &self.project_dir,
            &self.config.storage.progress_dir,
        ))
    }

    pub fn db_path(&self) -> PathBuf {
        resolve_path(&self.project_dir, &self.config.storage.database)
    }
}

/// Returns the .promptshelf directory if initialized, or
/// `ShelfError::NotInitialized` if not.
pub fn require_initialized() -> Result<PathBuf> {
    let project_dir = Path::new(PROJECT_DIR);

    if !project_dir.exists() {
        return Err(ShelfError::NotInitialized);
    }

    Ok(project_dir.to_path_buf())
}

pub fn is_initialized() -> bool {
    Path::new(PROJECT_DIR).exists()
}

/// Relative storage paths live inside the project data dir
pub fn resolve_path(project_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

/// Open an existing catalog. Runs pending migrations.
pub fn open_catalog_db(project_dir: &Path, config: &Config) -> Result<Database> {
    let db_path = resolve_path(project_dir, &config.storage.database);

    if !db_path.exists() {
        return Err(ShelfError::NotInitialized);
    }

    let db = Database::open(&db_path)?;
    db.initialize()?;
    Ok(db)
}

/// Create and initialize the catalog database
pub fn create_catalog_db(project_dir: &Path, config: &Config) -> Result<Database> {
    let db_path = resolve_path(project_dir, &config.storage.database);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&db_path)?;
    db.initialize()?;

    Ok(db)
}

/// clap value parser for `--var name=value`
pub fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Later `--var` flags override earlier ones
pub fn collect_vars(vars: Vec<(String, String)>) -> HashMap<String, String> {
    vars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_path() {
        let base = Path::new(".promptshelf");
        assert_eq!(
            resolve_path(base, Path::new("catalog.db")),
            PathBuf::from(".promptshelf/catalog.db")
        );

        let abs = std::env::temp_dir().join("elsewhere.db");
        assert_eq!(resolve_path(base, &abs), abs);
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("topic=green tea").unwrap(),
            ("topic".to_string(), "green tea".to_string())
        );
        assert_eq!(
            parse_var("eq=a=b").unwrap(),
            ("eq".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_var("blank=").unwrap().1, "");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_collect_vars_last_wins() {
        let vars = collect_vars(vec![
            ("a".to_string(), "1".to_string()),
            ("a".to_string(), "2".to_string()),
        ]);
        assert_eq!(vars["a"], "2");
    }

    #[test]
    fn test_open_catalog_requires_database() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();

        assert!(matches!(
            open_catalog_db(dir.path(), &config),
            Err(ShelfError::NotInitialized)
        ));

        create_catalog_db(dir.path(), &config).unwrap();
        assert!(open_catalog_db(dir.path(), &config).is_ok());
    }
}
