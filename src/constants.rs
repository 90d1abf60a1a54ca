//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Progress store constants
pub mod progress {
    /// Storage key prefix; the chain id is appended
    pub const KEY_PREFIX: &str = "chain-progress-";

    /// Default progress directory inside the project data dir
    pub const DEFAULT_DIR: &str = "progress";
}

/// Catalog constants
pub mod catalog {
    /// Maximum slug length for chains and prompts
    pub const MAX_SLUG_LEN: usize = 100;

    /// Default database path inside the project data dir
    pub const DEFAULT_DATABASE: &str = "catalog.db";
}

/// Inference endpoint constants
pub mod inference {
    /// Request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Wait before the single retry when the model is still loading (seconds)
    pub const DEFAULT_LOADING_RETRY_SECS: u64 = 20;

    /// Upper bound on an endpoint-suggested loading wait (seconds)
    pub const MAX_LOADING_RETRY_SECS: u64 = 120;

    /// Default generation length
    pub const DEFAULT_MAX_NEW_TOKENS: u32 = 512;

    /// Environment variable consulted when no API key is configured
    pub const API_KEY_ENV: &str = "PROMPTSHELF_API_KEY";
}

/// Display constants
pub mod display {
    /// Width of the progress bar in characters
    pub const PROGRESS_BAR_WIDTH: usize = 24;
}
