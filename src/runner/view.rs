//! View models handed to the shell for rendering.

use std::collections::HashMap;

use serde::Serialize;

use super::access::is_locked;
use super::engine::{ChainRunner, StepStatus};
use super::presentation::{Segment, segment};
use crate::storage::ProgressStore;
use crate::types::{Chain, PromptVariable, Step};

/// Full content of an unlocked step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepContent {
    pub prompt_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    pub variables: Vec<PromptVariable>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    /// 0-based index
    pub index: usize,
    /// 1-based position shown to the viewer
    pub position: usize,
    pub total: usize,
    pub title: String,
    pub status: StepStatus,
    pub locked: bool,
    /// `None` when locked, and for summary rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<StepContent>,
}

impl StepView {
    fn summary(chain: &Chain, step: &Step, index: usize, status: StepStatus, locked: bool) -> Self {
        Self {
            index,
            position: index + 1,
            total: chain.step_count(),
            title: step.display_title().to_string(),
            status,
            locked,
            content: None,
        }
    }

    fn detailed(
        chain: &Chain,
        step: &Step,
        index: usize,
        status: StepStatus,
        locked: bool,
        values: &HashMap<String, String>,
    ) -> Self {
        let mut view = Self::summary(chain, step, index, status, locked);
        if !locked {
            let prompt = &step.prompt;
            view.content = Some(StepContent {
                prompt_title: prompt.title.clone(),
                prompt_description: prompt.description.clone(),
                input_instructions: step.input_instructions.clone(),
                context_note: step.context_note.clone(),
                estimated_minutes: step.estimated_minutes,
                variables: prompt.variables.clone(),
                segments: segment(&prompt.prompt_text, &prompt.variable_names(), values),
            });
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainView {
    pub chain_id: String,
    pub slug: String,
    pub title: String,
    pub is_premium: bool,
    pub has_access: bool,
    pub percent_complete: u8,
    pub is_complete: bool,
    pub started_at: String,
    /// `None` on the completion screen or for a chain without steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<StepView>,
    pub steps: Vec<StepView>,
}

impl ChainView {
    pub fn build<S: ProgressStore>(
        chain: &Chain,
        runner: &ChainRunner<S>,
        viewer_has_access: bool,
        values: &HashMap<String, String>,
    ) -> Self {
        let steps = chain
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                StepView::summary(
                    chain,
                    step,
                    index,
                    runner.step_status(index),
                    is_locked(chain, step, viewer_has_access),
                )
            })
            .collect();

        let current_step = if runner.is_complete() {
            None
        } else {
            let index = runner.current_step_index();
            chain.step_at(index).map(|step| {
                StepView::detailed(
                    chain,
                    step,
                    index,
                    runner.step_status(index),
                    is_locked(chain, step, viewer_has_access),
                    values,
                )
            })
        };

        Self {
            chain_id: chain.id.clone(),
            slug: chain.slug.clone(),
            title: chain.title.clone(),
            is_premium: chain.is_premium,
            has_access: viewer_has_access,
            percent_complete: runner.percent_complete(),
            is_complete: runner.is_complete(),
            started_at: runner.started_at().to_rfc3339(),
            current_step,
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::presentation::SegmentKind;
    use crate::storage::MemoryProgressStore;
    use crate::types::chain::fixtures::chain;

    #[test]
    fn test_locked_chain_hides_content() {
        let c = chain(3, true);
        let store = MemoryProgressStore::new();
        let mut runner = ChainRunner::open(&c.id, c.step_count(), &store);
        runner.mark_current_complete();

        let view = ChainView::build(&c, &runner, false, &HashMap::new());
        assert!(view.steps.iter().all(|s| s.locked));
        assert!(view.steps.iter().all(|s| s.content.is_none()));

        let current = view.current_step.as_ref().unwrap();
        assert!(current.locked);
        assert!(current.content.is_none());
        assert_eq!(current.position, 2);
        assert_eq!(current.title, "Prompt 2");

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("Write about"));
        assert!(!json.contains("Instructions 2"));
    }

    #[test]
    fn test_unlocked_step_has_segments() {
        let c = chain(2, true);
        let store = MemoryProgressStore::new();
        let runner = ChainRunner::open(&c.id, c.step_count(), &store);

        let values: HashMap<String, String> =
            [("topic".to_string(), "tea".to_string())].into_iter().collect();
        let view = ChainView::build(&c, &runner, true, &values);

        let content = view.current_step.unwrap().content.unwrap();
        assert_eq!(content.input_instructions.as_deref(), Some("Instructions 1"));
        assert_eq!(content.segments[1].kind, SegmentKind::Filled);
        assert_eq!(content.segments[1].text, "tea");
    }

    #[test]
    fn test_complete_chain_has_no_current_step() {
        let c = chain(1, false);
        let store = MemoryProgressStore::new();
        let mut runner = ChainRunner::open(&c.id, c.step_count(), &store);
        runner.mark_current_complete();

        let view = ChainView::build(&c, &runner, false, &HashMap::new());
        assert!(view.is_complete);
        assert_eq!(view.percent_complete, 100);
        assert!(view.current_step.is_none());
        assert_eq!(view.steps[0].status, StepStatus::Completed);
    }

    #[test]
    fn test_empty_chain_view() {
        let c = chain(0, false);
        let store = MemoryProgressStore::new();
        let runner = ChainRunner::open(&c.id, 0, &store);
        let view = ChainView::build(&c, &runner, true, &HashMap::new());
        assert!(view.is_complete);
        assert!(view.steps.is_empty());
        assert!(view.current_step.is_none());
    }
}
