//! Run Command
//!
//! Walk through a chain one step at a time. Progress is stored per chain
//! in the project's progress directory.
//!
//! Usage:
//!   promptshelf run <slug> [status|complete|prev|jump <n>|reset] [--var k=v]... [-f json]

use std::collections::HashMap;

use crate::cli::CommandContext;
use crate::cli::ui::{Output, format_duration};
use crate::runner::{ChainRunner, ChainView, StepView, missing_variables};
use crate::storage::ProgressStore;
use crate::types::{Chain, Result, ValidationError, ValidationErrorKind};

/// Transition applied before the view is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Status,
    Complete,
    Previous,
    /// 1-based step position
    Jump(usize),
    Reset,
}

pub fn run(
    slug: &str,
    action: RunAction,
    values: &HashMap<String, String>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();
    let chain = catalog.get_chain(slug)?;
    let has_access = catalog.resolve_access(&ctx.viewer, &chain)?.has_access();

    let store = ctx.progress_store();
    let mut runner = ChainRunner::open(chain.id.as_str(), chain.step_count(), &store);
    apply(&mut runner, action)?;

    let view = ChainView::build(&chain, &runner, has_access, values);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_view(&chain, &view, values);
    Ok(())
}

/// Apply `action` to the runner; jump positions are validated here
pub fn apply<S: ProgressStore>(runner: &mut ChainRunner<S>, action: RunAction) -> Result<()> {
    match action {
        RunAction::Status => {}
        RunAction::Complete => runner.mark_current_complete(),
        RunAction::Previous => runner.go_to_previous(),
        RunAction::Jump(position) => {
            let total = runner.step_count();
            if position == 0 || !runner.jump_to(position - 1) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Range,
                    format!("step {} is out of range (1-{})", position, total),
                )
                .with_field("step")
                .into());
            }
        }
        RunAction::Reset => runner.reset(),
    }
    Ok(())
}

fn print_view(chain: &Chain, view: &ChainView, values: &HashMap<String, String>) {
    let out = Output::new();

    out.header(&view.title);
    out.progress(view.percent_complete);
    if let Ok(started) = chrono::DateTime::parse_from_rfc3339(&view.started_at) {
        let elapsed = chrono::Utc::now().signed_duration_since(started);
        println!(
            "Started {} ago",
            format_duration(elapsed.num_seconds().max(0) as u64)
        );
    }
    println!();

    for step in &view.steps {
        out.step_row(step.position, &step.title, step.status, step.locked);
    }

    if view.steps.is_empty() {
        out.info("This chain has no steps.");
        return;
    }

    match &view.current_step {
        None => {
            println!();
            out.success("Chain complete! Run with 'reset' to start over.");
        }
        Some(step) => print_step(chain, step, values, &out),
    }
}

fn print_step(chain: &Chain, step: &StepView, values: &HashMap<String, String>, out: &Output) {
    out.section(&format!(
        "Step {} of {}: {}",
        step.position, step.total, step.title
    ));

    let Some(content) = &step.content else {
        println!("🔒 This step is part of a premium chain.");
        println!(
            "   Run 'promptshelf purchase {}' ({} credits) to unlock it.",
            chain.slug, chain.price_credits
        );
        return;
    };

    if let Some(description) = &content.prompt_description {
        println!("{}", description);
    }
    if let Some(minutes) = content.estimated_minutes {
        println!("⏱  ~{} min", minutes);
    }
    if let Some(instructions) = &content.input_instructions {
        println!();
        println!("What to do:");
        println!("  {}", instructions);
    }
    if let Some(note) = &content.context_note {
        println!();
        println!("Note: {}", note);
    }

    println!();
    out.prompt(&content.segments);

    let names: Vec<&str> = content.variables.iter().map(|v| v.name.as_str()).collect();
    let missing = missing_variables(&names, values);
    if !missing.is_empty() {
        println!();
        let hints: Vec<String> = missing
            .iter()
            .map(|name| {
                let description = content
                    .variables
                    .iter()
                    .find(|v| v.name == *name)
                    .and_then(|v| v.description.as_deref());
                match description {
                    Some(d) => format!("--var {}=... ({})", name, d),
                    None => format!("--var {}=...", name),
                }
            })
            .collect();
        out.info(&format!("Fill in: {}", hints.join(", ")));
    }

    println!();
    println!(
        "Next: 'promptshelf run {} complete' when done, or 'promptshelf exec {}' to run the prompt.",
        chain.slug, chain.slug
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryProgressStore;
    use crate::types::ShelfError;

    #[test]
    fn test_apply_actions() {
        let store = MemoryProgressStore::new();
        let mut runner = ChainRunner::open("c", 3, &store);

        apply(&mut runner, RunAction::Complete).unwrap();
        apply(&mut runner, RunAction::Complete).unwrap();
        assert_eq!(runner.current_step_index(), 2);

        apply(&mut runner, RunAction::Previous).unwrap();
        assert_eq!(runner.current_step_index(), 1);

        apply(&mut runner, RunAction::Jump(3)).unwrap();
        assert_eq!(runner.current_step_index(), 2);

        apply(&mut runner, RunAction::Status).unwrap();
        assert_eq!(runner.current_step_index(), 2);

        apply(&mut runner, RunAction::Reset).unwrap();
        assert_eq!(runner.current_step_index(), 0);
        assert!(runner.completed_step_indices().is_empty());
    }

    #[test]
    fn test_jump_is_one_based_and_checked() {
        let store = MemoryProgressStore::new();
        let mut runner = ChainRunner::open("c", 2, &store);

        for position in [0, 3] {
            let err = apply(&mut runner, RunAction::Jump(position)).unwrap_err();
            assert!(matches!(err, ShelfError::Validation(_)));
            assert!(err.to_string().contains("out of range (1-2)"));
        }
        assert_eq!(runner.current_step_index(), 0);

        apply(&mut runner, RunAction::Jump(1)).unwrap();
        assert_eq!(runner.current_step_index(), 0);
    }
}
