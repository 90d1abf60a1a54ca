//! Exec Command
//!
//! Render the current step's prompt with `--var` values and send it to the
//! configured inference endpoint. Progress is not changed.

use std::collections::HashMap;

use tracing::info;

use crate::cli::CommandContext;
use crate::inference::{HttpInferenceClient, InferenceClient, InferenceOutput};
use crate::runner::{ChainRunner, is_locked, missing_variables, render};
use crate::types::{Chain, Result, ShelfError, ValidationError, ValidationErrorKind};

pub async fn run(slug: &str, values: &HashMap<String, String>, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();
    let chain = catalog.get_chain(slug)?;
    let has_access = catalog.resolve_access(&ctx.viewer, &chain)?.has_access();

    let store = ctx.progress_store();
    let runner = ChainRunner::open(chain.id.as_str(), chain.step_count(), &store);
    if runner.is_complete() {
        return Err(ValidationError::new(
            ValidationErrorKind::Consistency,
            format!("'{}' is complete. Jump to a step or reset it first.", slug),
        )
        .into());
    }

    let prompt = prepare_prompt(&chain, runner.current_step_index(), has_access, values)?;
    let client = HttpInferenceClient::new(&ctx.config.inference)?;
    info!(chain = %slug, step = runner.current_step_index() + 1, "Executing step prompt");

    let output = client.run(&prompt).await?;
    print_output(&output, client.name(), format)
}

/// Rendered prompt for the step at `index`. Fails when the step is locked
/// or a declared variable has no value.
pub fn prepare_prompt(
    chain: &Chain,
    index: usize,
    has_access: bool,
    values: &HashMap<String, String>,
) -> Result<String> {
    let step = chain
        .step_at(index)
        .ok_or_else(|| ShelfError::not_found("Step", (index + 1).to_string()))?;

    if is_locked(chain, step, has_access) {
        return Err(ShelfError::Locked {
            position: step.position,
        });
    }

    let names = step.prompt.variable_names();
    let missing = missing_variables(&names, values);
    if !missing.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!(
                "missing values for {} (pass --var name=value)",
                missing.join(", ")
            ),
        )
        .with_field("var")
        .into());
    }

    Ok(render(&step.prompt.prompt_text, &names, values))
}

fn print_output(output: &InferenceOutput, source: &str, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    println!("{}", output.text.trim());
    println!();
    println!(
        "── {} · {:.1}s",
        source,
        output.elapsed_ms as f64 / 1000.0
    );
    Ok(())
}
