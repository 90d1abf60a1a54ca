pub mod chain;
pub mod error;
pub mod progress;

pub use chain::{Chain, Prompt, PromptVariable, Step, validate_slug};
pub use error::{
    ErrorCategory, ErrorClassifier, InferenceError, Result, ResultExt, ShelfError,
    ValidationError, ValidationErrorKind,
};
pub use progress::{AccessGrant, ProgressRecord};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for viewer (user) IDs
///
/// Prevents accidental mixing of viewer IDs with chain or prompt IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewerId(String);

impl ViewerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ViewerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ViewerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ViewerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A viewer together with the admin flag from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: ViewerId,
    pub is_admin: bool,
}

impl Viewer {
    pub fn new(id: impl Into<ViewerId>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<ViewerId>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_id() {
        let id = ViewerId::from("user-1");
        assert_eq!(id.as_str(), "user-1");
        assert_eq!(id.to_string(), "user-1");
    }

    #[test]
    fn test_viewer_constructors() {
        assert!(!Viewer::new("a").is_admin);
        assert!(Viewer::admin("a").is_admin);
    }
}
