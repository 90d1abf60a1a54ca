//! Progression Engine
//!
//! Walks a viewer through a chain's steps. State is loaded from a
//! [`ProgressStore`] on open and written back after every transition.
//!
//! `is_complete` is a sticky flag for "viewing the completion screen":
//! it is derived from the completed set on open, set when the last
//! outstanding step is completed, and cleared by `jump_to` and `reset`.
//! [`ChainRunner::all_steps_done`] is the derived property.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::storage::ProgressStore;
use crate::types::ProgressRecord;

/// In-memory traversal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub current_step_index: usize,
    pub completed_step_indices: BTreeSet<usize>,
    pub is_complete: bool,
}

/// Where a step sits relative to the viewer's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

pub struct ChainRunner<S: ProgressStore> {
    chain_id: String,
    step_count: usize,
    started_at: DateTime<Utc>,
    state: RunState,
    store: S,
}

impl<S: ProgressStore> ChainRunner<S> {
    /// Load progress for `chain_id`, dropping anything that no longer fits
    /// a chain of `step_count` steps (steps removed by an edit).
    pub fn open(chain_id: impl Into<String>, step_count: usize, store: S) -> Self {
        let chain_id = chain_id.into();
        let record = store.load(&chain_id);

        let completed: BTreeSet<usize> = record
            .completed_steps
            .iter()
            .copied()
            .filter(|&i| i < step_count)
            .collect();
        let current = record.current_step.min(step_count.saturating_sub(1));

        if completed.len() != record.completed_steps.len() || current != record.current_step {
            debug!(
                chain_id = %chain_id,
                step_count,
                "Stored progress trimmed to current chain length"
            );
        }

        let is_complete = completed.len() == step_count;

        Self {
            chain_id,
            step_count,
            started_at: record.started_at,
            state: RunState {
                current_step_index: current,
                completed_step_indices: completed,
                is_complete,
            },
            store,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn current_step_index(&self) -> usize {
        self.state.current_step_index
    }

    pub fn completed_step_indices(&self) -> &BTreeSet<usize> {
        &self.state.completed_step_indices
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete
    }

    /// Every step is in the completed set, regardless of what is being viewed
    pub fn all_steps_done(&self) -> bool {
        self.state.completed_step_indices.len() == self.step_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Completed share rounded to the nearest whole percent
    pub fn percent_complete(&self) -> u8 {
        if self.step_count == 0 {
            return 100;
        }
        let done = self.state.completed_step_indices.len().min(self.step_count);
        ((done as f64 / self.step_count as f64) * 100.0).round() as u8
    }

    pub fn step_status(&self, index: usize) -> StepStatus {
        if self.state.completed_step_indices.contains(&index) {
            StepStatus::Completed
        } else if index == self.state.current_step_index && !self.state.is_complete {
            StepStatus::Current
        } else {
            StepStatus::Upcoming
        }
    }

    /// Complete the current step and advance, or enter the complete state
    /// when no step is left outstanding.
    pub fn mark_current_complete(&mut self) {
        if self.step_count == 0 {
            return;
        }

        let current = self.state.current_step_index;
        self.state.completed_step_indices.insert(current);

        if self.all_steps_done() {
            self.state.is_complete = true;
            debug!(chain_id = %self.chain_id, "Chain complete");
        } else if current < self.step_count - 1 {
            self.state.current_step_index = current + 1;
        }

        self.persist();
    }

    /// Step back one, stopping at the first step
    pub fn go_to_previous(&mut self) {
        self.state.current_step_index = self.state.current_step_index.saturating_sub(1);
        self.persist();
    }

    /// Move straight to `index`. Out-of-range indices are ignored and
    /// reported through the return value.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.step_count {
            debug!(
                chain_id = %self.chain_id,
                index,
                step_count = self.step_count,
                "Ignoring jump to out-of-range step"
            );
            return false;
        }

        self.state.current_step_index = index;
        self.state.is_complete = false;
        self.persist();
        true
    }

    /// Start over and drop the stored record
    pub fn reset(&mut self) {
        self.state = RunState {
            current_step_index: 0,
            completed_step_indices: BTreeSet::new(),
            is_complete: false,
        };
        self.started_at = Utc::now();
        self.store.clear(&self.chain_id);
        debug!(chain_id = %self.chain_id, "Progress reset");
    }

    fn persist(&self) {
        let record = ProgressRecord {
            current_step: self.state.current_step_index,
            completed_steps: self.state.completed_step_indices.clone(),
            started_at: self.started_at,
        };
        self.store.save(&self.chain_id, &record);
    }
}
