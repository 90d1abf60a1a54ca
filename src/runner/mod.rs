//! Chain Runner
//!
//! Guided traversal of a chain:
//!
//! - [`engine`]: progression state machine over a [`ProgressStore`](crate::storage::ProgressStore)
//! - [`access`]: paywall check for step content
//! - [`presentation`]: placeholder segmentation for previews
//! - [`view`]: serializable view models for the shell

pub mod access;
pub mod engine;
pub mod presentation;
pub mod view;

pub use access::is_locked;
pub use engine::{ChainRunner, RunState, StepStatus};
pub use presentation::{
    Segment, SegmentKind, extract_variables, missing_variables, render, segment,
};
pub use view::{ChainView, StepContent, StepView};
