pub mod catalog;
pub mod database;
pub mod document;
pub mod progress_store;

pub use catalog::{Catalog, ChainFilter, ChainSummary, PurchaseOutcome, PurchaseRecord};
pub use database::{Database, PoolConfig, SharedDatabase};
pub use document::{ChainDocument, PromptDocument, StepDocument};
pub use progress_store::{FileProgressStore, MemoryProgressStore, ProgressStore, storage_key};
