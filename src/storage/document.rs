//! Chain documents for `promptshelf import`.
//!
//! A document file holds one chain or a list of chains, in YAML or JSON.
//! Prompts are written inline with each step and are matched by slug on save.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runner::extract_variables;
use crate::types::{Chain, Prompt, PromptVariable, Result, ShelfError, Step};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDocument {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub price_credits: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub steps: Vec<StepDocument>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub input_instructions: Option<String>,
    #[serde(default)]
    pub context_note: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    pub prompt: PromptDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDocument {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub text: String,
    /// Detected from `{{name}}` placeholders when omitted
    #[serde(default)]
    pub variables: Option<Vec<PromptVariable>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Many(Vec<ChainDocument>),
    One(Box<ChainDocument>),
}

impl ChainDocument {
    /// Read every chain in a `.yaml`, `.yml` or `.json` file
    pub fn read_all(path: &Path) -> Result<Vec<ChainDocument>> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let file: DocumentFile = match ext.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(ShelfError::Config(format!(
                    "unsupported document type: {} (expected .yaml, .yml or .json)",
                    path.display()
                )));
            }
        };

        Ok(match file {
            DocumentFile::Many(docs) => docs,
            DocumentFile::One(doc) => vec![*doc],
        })
    }

    /// Build a chain authored by `author_id`. Positions follow document order.
    pub fn into_chain(self, author_id: &str) -> Chain {
        let steps = self
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| Step {
                id: new_id(),
                position: i + 1,
                prompt: step.prompt.into_prompt(author_id),
                title_override: step.title,
                input_instructions: step.input_instructions,
                context_note: step.context_note,
                estimated_minutes: step.estimated_minutes,
            })
            .collect();

        Chain {
            id: new_id(),
            slug: self.slug,
            title: self.title,
            description: self.description,
            author_id: author_id.to_string(),
            is_premium: self.is_premium,
            price_credits: self.price_credits,
            is_published: self.is_published,
            steps,
        }
    }
}

impl PromptDocument {
    fn into_prompt(self, author_id: &str) -> Prompt {
        let variables = self.variables.unwrap_or_else(|| {
            extract_variables(&self.text)
                .into_iter()
                .map(PromptVariable::new)
                .collect()
        });

        Prompt {
            id: new_id(),
            slug: self.slug,
            title: self.title,
            description: self.description,
            prompt_text: self.text,
            variables,
            author_id: author_id.to_string(),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML: &str = r#"
slug: weekly-review
title: Weekly Review
is_premium: true
price_credits: 25
steps:
  - title: Look back
    estimated_minutes: 10
    prompt:
      slug: look-back
      title: Look Back
      text: "What went well in {{project}} this week for {{team}}?"
  - prompt:
      slug: plan-ahead
      title: Plan Ahead
      text: "List three goals for {{project}}."
      variables:
        - name: project
          description: Project name
"#;

    #[test]
    fn test_read_yaml_single() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("review.yaml");
        std::fs::write(&path, YAML).unwrap();

        let docs = ChainDocument::read_all(&path).unwrap();
        assert_eq!(docs.len(), 1);

        let chain = docs.into_iter().next().unwrap().into_chain("alice");
        assert!(chain.validate().is_ok());
        assert_eq!(chain.author_id, "alice");
        assert!(chain.is_premium);
        assert_eq!(chain.price_credits, 25);
        assert!(chain.is_published);
        assert!(chain.steps.iter().all(|s| s.prompt.author_id == "alice"));
        assert_eq!(chain.steps[0].position, 1);
        assert_eq!(chain.steps[0].display_title(), "Look back");
        assert_eq!(chain.steps[1].display_title(), "Plan Ahead");
        assert_eq!(
            chain.steps[0].prompt.variable_names(),
            vec!["project", "team"]
        );
        assert_eq!(
            chain.steps[1].prompt.variables[0].description.as_deref(),
            Some("Project name")
        );
    }

    #[test]
    fn test_read_json_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chains.json");
        std::fs::write(
            &path,
            r#"[{"slug":"a","title":"A","steps":[]},{"slug":"b","title":"B","is_published":false}]"#,
        )
        .unwrap();

        let docs = ChainDocument::read_all(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(!docs[1].is_published);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.txt");
        std::fs::write(&path, "slug: a").unwrap();
        assert!(matches!(
            ChainDocument::read_all(&path),
            Err(ShelfError::Config(_))
        ));
    }
}
