//! Persisted traversal state for one chain.
//!
//! Stored layout (one record per chain):
//!
//! ```json
//! { "currentStep": 1, "completedSteps": [0], "startedAt": "2026-01-01T00:00:00Z" }
//! ```
//!
//! There is no schema version. Records that fail to parse are discarded.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// 0-based index of the step being viewed
    pub current_step: usize,
    /// 0-based indices of completed steps
    pub completed_steps: BTreeSet<usize>,
    pub started_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Record for a chain that has never been visited
    pub fn fresh() -> Self {
        Self {
            current_step: 0,
            completed_steps: BTreeSet::new(),
            started_at: Utc::now(),
        }
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::fresh()
    }
}

/// How the viewer came to see a chain's full content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessGrant {
    /// Viewer authored the chain
    Owner,
    /// Viewer holds a purchase record
    Purchased,
    /// Chain is not monetized
    Free,
    /// Monetized and not purchased
    None,
}

impl AccessGrant {
    pub fn has_access(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Purchased => write!(f, "purchased"),
            Self::Free => write!(f, "free"),
            Self::None => write!(f, "locked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() {
        let record = ProgressRecord {
            current_step: 2,
            completed_steps: [1, 0].into_iter().collect(),
            started_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["currentStep"], 2);
        assert_eq!(json["completedSteps"], serde_json::json!([0, 1]));
        assert_eq!(json["startedAt"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_parses_millisecond_timestamps() {
        let record: ProgressRecord = serde_json::from_str(
            r#"{"currentStep":0,"completedSteps":[],"startedAt":"2025-03-04T10:11:12.345Z"}"#,
        )
        .unwrap();
        assert_eq!(record.current_step, 0);
        assert!(record.completed_steps.is_empty());
    }

    #[test]
    fn test_access_grant() {
        assert!(AccessGrant::Owner.has_access());
        assert!(AccessGrant::Purchased.has_access());
        assert!(AccessGrant::Free.has_access());
        assert!(!AccessGrant::None.has_access());
        assert_eq!(AccessGrant::None.to_string(), "locked");
    }
}
