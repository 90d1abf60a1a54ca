//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! Inference failures are classified so the caller can decide whether a
//! retry makes sense:
//!
//! - **ModelLoading**: Endpoint is warming the model (single delayed retry)
//! - **RateLimit**: API rate limiting
//! - **Auth**: Authentication failures (fail fast)
//! - **Network**: Connectivity issues
//! - **Transient**: Temporary server issues
//!
//! ## Design Principles
//!
//! - Single unified error type (ShelfError) for the entire application
//! - Structured error variants with context for better debugging
//! - Progress persistence never produces errors (see `storage::progress_store`)

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for inference responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Model is still loading on the endpoint - retry once after a delay
    ModelLoading,
    /// Rate limited
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues
    Network,
    /// Endpoint or model not found
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Response body could not be understood
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelLoading => write!(f, "MODEL_LOADING"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Only a loading model earns the automatic retry
    pub fn is_auto_retryable(&self) -> bool {
        matches!(self, Self::ModelLoading)
    }

    /// User-facing hint for the category
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ModelLoading => "the model is loading, try again shortly",
            Self::RateLimit => "too many requests, wait before running again",
            Self::Auth => "check the inference API key",
            Self::Network => "check the network connection",
            Self::Unavailable => "check the endpoint and model name",
            Self::BadRequest => "the prompt was rejected by the endpoint",
            Self::ParseError => "the endpoint returned an unexpected response",
            Self::Transient => "the endpoint had a temporary failure",
            Self::Unknown => "unexpected inference failure",
        }
    }
}

// =============================================================================
// Inference Error
// =============================================================================

/// Inference error with category and retry hint
#[derive(Debug, Clone)]
pub struct InferenceError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

impl std::error::Error for InferenceError {}

impl InferenceError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_auto_retryable(&self) -> bool {
        self.category.is_auto_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw endpoint failures to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a transport-level failure message
    pub fn classify(message: &str) -> InferenceError {
        let lower = message.to_lowercase();

        if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("dns")
        {
            return InferenceError::new(ErrorCategory::Network, message);
        }

        if lower.contains("decod") || lower.contains("json") || lower.contains("expected") {
            return InferenceError::new(ErrorCategory::ParseError, message);
        }

        InferenceError::new(ErrorCategory::Unknown, message)
    }

    /// Classify HTTP status code with the response body
    pub fn classify_http_status(status: u16, body: &str) -> InferenceError {
        match status {
            503 if body.to_lowercase().contains("loading") => {
                InferenceError::new(ErrorCategory::ModelLoading, body)
            }
            429 => InferenceError::new(ErrorCategory::RateLimit, body)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => InferenceError::new(ErrorCategory::Auth, body),
            400 | 422 => InferenceError::new(ErrorCategory::BadRequest, body),
            404 => InferenceError::new(ErrorCategory::Unavailable, body),
            500 | 502 | 503 | 504 => InferenceError::new(ErrorCategory::Transient, body),
            _ => InferenceError::new(ErrorCategory::Unknown, body),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing or blank
    MissingField,
    /// Invalid format
    Format,
    /// Value out of range
    Range,
    /// Consistency check failed (step ordering, references)
    Consistency,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ShelfError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Inference Errors
    // -------------------------------------------------------------------------
    #[error("Inference error: {0}")]
    Inference(InferenceError),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Step {position} is locked until the chain is purchased")]
    Locked { position: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'promptshelf init' first")]
    NotInitialized,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<InferenceError> for ShelfError {
    fn from(err: InferenceError) -> Self {
        ShelfError::Inference(err)
    }
}

impl From<ValidationError> for ShelfError {
    fn from(err: ValidationError) -> Self {
        ShelfError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;

impl ShelfError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ShelfError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ShelfError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
