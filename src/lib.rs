//! promptshelf - Prompt Library with Guided Prompt Chains
//!
//! A local prompt catalog where ordered chains of prompts are worked
//! through one step at a time, with progress that survives restarts.
//!
//! ## Core Features
//!
//! - **Chain Runner**: Progression state machine with per-chain persisted progress
//! - **Paywall**: Premium chains lock step content until purchased with credits
//! - **Placeholders**: `{{name}}` variables highlighted and filled for previews
//! - **Execution**: Optional HTTP inference endpoint with a loading-model retry
//!
//! ## Quick Start
//!
//! ```ignore
//! use promptshelf::{Catalog, ChainRunner, Database, FileProgressStore};
//!
//! let db = Database::open(".promptshelf/catalog.db")?;
//! db.initialize()?;
//! let chain = Catalog::new(&db).get_chain("weekly-review")?;
//!
//! let store = FileProgressStore::new(".promptshelf/progress");
//! let mut runner = ChainRunner::open(chain.id.as_str(), chain.step_count(), &store);
//! runner.mark_current_complete();
//! println!("{}% done", runner.percent_complete());
//! ```
//!
//! ## Modules
//!
//! - [`runner`]: Progression engine, access check, and view models
//! - [`storage`]: SQLite catalog and progress stores
//! - [`inference`]: Prompt execution client
//! - [`config`]: Layered configuration
//! - [`types`]: Domain records and errors

pub mod cli;
pub mod config;
pub mod constants;
pub mod inference;
pub mod runner;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, Result, ResultExt, ShelfError};

// Domain
pub use types::{AccessGrant, Chain, ProgressRecord, Prompt, Step, Viewer, ViewerId};

// Storage
pub use storage::{
    Catalog, ChainDocument, Database, FileProgressStore, MemoryProgressStore, PoolConfig,
    ProgressStore, SharedDatabase,
};

// Runner
pub use runner::{ChainRunner, ChainView, RunState, StepStatus};

// Inference
pub use inference::{HttpInferenceClient, InferenceClient, InferenceOutput};
