//! Chain, step and prompt records as handed over by the data layer.

use serde::{Deserialize, Serialize};

use super::error::{ValidationError, ValidationErrorKind};
use crate::constants::catalog::MAX_SLUG_LEN;

/// Named placeholder declared by a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PromptVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Reusable prompt template with `{{name}}` placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub prompt_text: String,
    #[serde(default)]
    pub variables: Vec<PromptVariable>,
    pub author_id: String,
}

impl Prompt {
    /// Declared variable names in declaration order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }
}

/// One stage of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    /// 1-based ordinal within the chain
    pub position: usize,
    pub prompt: Prompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

impl Step {
    /// Title shown for the step: the override if set, else the prompt title
    pub fn display_title(&self) -> &str {
        self.title_override
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.prompt.title)
    }
}

/// Ordered multi-step workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub price_credits: i64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Chain {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step by 0-based index in position order
    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Sort steps by position. Loaders call this before `validate`.
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| s.position);
    }

    /// Check slug format, pricing and that positions run 1..=N without gaps.
    ///
    /// Expects steps sorted by position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;

        if self.title.trim().is_empty() {
            return Err(
                ValidationError::new(ValidationErrorKind::MissingField, "title is required")
                    .with_field("title"),
            );
        }

        if self.price_credits < 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::Range,
                format!("price must not be negative, got {}", self.price_credits),
            )
            .with_field("price_credits"));
        }

        for (index, step) in self.steps.iter().enumerate() {
            let expected = index + 1;
            if step.position != expected {
                let message = if step.position < expected {
                    format!("duplicate step position {}", step.position)
                } else {
                    format!(
                        "gap in step positions: expected {}, found {}",
                        expected, step.position
                    )
                };
                return Err(ValidationError::new(ValidationErrorKind::Consistency, message)
                    .with_field("steps"));
            }
        }

        Ok(())
    }
}

/// Slugs are lowercase ASCII letters, digits and dashes
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(
            ValidationError::new(ValidationErrorKind::MissingField, "slug is required")
                .with_field("slug"),
        );
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::new(
            ValidationErrorKind::Range,
            format!("slug longer than {} characters", MAX_SLUG_LEN),
        )
        .with_field("slug"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::new(
            ValidationErrorKind::Format,
            format!("'{}' may only contain a-z, 0-9 and '-'", slug),
        )
        .with_field("slug"));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::chain;
    use super::*;

    #[test]
    fn test_valid_chain() {
        assert!(chain(3, false).validate().is_ok());
        assert!(chain(0, false).validate().is_ok());
    }

    #[test]
    fn test_gap_in_positions() {
        let mut c = chain(3, false);
        c.steps[2].position = 4;
        let err = c.validate().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Consistency);
        assert!(err.message.contains("expected 3, found 4"));
    }

    #[test]
    fn test_duplicate_positions() {
        let mut c = chain(3, false);
        c.steps[2].position = 2;
        let err = c.validate().unwrap_err();
        assert!(err.message.contains("duplicate step position 2"));
    }

    #[test]
    fn test_sort_steps_before_validate() {
        let mut c = chain(3, false);
        c.steps.reverse();
        assert!(c.validate().is_err());
        c.sort_steps();
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("daily-journal-2").is_ok());
        assert_eq!(
            validate_slug("").unwrap_err().kind,
            ValidationErrorKind::MissingField
        );
        assert_eq!(
            validate_slug("Daily Journal").unwrap_err().kind,
            ValidationErrorKind::Format
        );
        assert_eq!(
            validate_slug(&"a".repeat(MAX_SLUG_LEN + 1))
                .unwrap_err()
                .kind,
            ValidationErrorKind::Range
        );
    }

    #[test]
    fn test_display_title() {
        let mut c = chain(1, false);
        assert_eq!(c.steps[0].display_title(), "Prompt 1");
        c.steps[0].title_override = Some("  ".to_string());
        assert_eq!(c.steps[0].display_title(), "Prompt 1");
        c.steps[0].title_override = Some("Brainstorm".to_string());
        assert_eq!(c.steps[0].display_title(), "Brainstorm");
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut c = chain(1, true);
        c.price_credits = -1;
        assert_eq!(c.validate().unwrap_err().kind, ValidationErrorKind::Range);
    }
}
