//! Status Command
//!
//! Display catalog totals and chains in progress.

use std::collections::HashMap;

use crate::cli::CommandContext;
use crate::cli::ui::render_progress_bar;
use crate::cli::util::is_initialized;
use crate::constants::display::PROGRESS_BAR_WIDTH;
use crate::runner::ChainRunner;
use crate::storage::ChainFilter;
use crate::types::Result;

pub fn run(format: &str) -> Result<()> {
    let json_output = format == "json";

    if !is_initialized() {
        if json_output {
            println!("{{\"status\": \"not_initialized\"}}");
        } else {
            println!("promptshelf Status");
            println!("══════════════════════════════════════");
            println!("Not initialized. Run 'promptshelf init' first.");
        }
        // Informational: not an error
        return Ok(());
    }

    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();
    let chains = catalog.list_chains(&ChainFilter::default(), &ctx.viewer)?;
    let prompt_count = ctx.db.count_rows("prompts")?;
    let balance = catalog.wallet_balance(&ctx.viewer)?;

    // Stored records for chains that still exist
    let store = ctx.progress_store();
    let by_id: HashMap<&str, _> = chains.iter().map(|c| (c.id.as_str(), c)).collect();
    let in_progress: Vec<_> = store
        .list()
        .into_iter()
        .filter_map(|id| {
            let summary = by_id.get(id.as_str())?;
            let runner = ChainRunner::open(id.as_str(), summary.step_count, &store);
            Some((
                summary.slug.clone(),
                summary.title.clone(),
                runner.current_step_index() + 1,
                summary.step_count,
                runner.percent_complete(),
                runner.is_complete(),
            ))
        })
        .collect();

    if json_output {
        let progress: Vec<_> = in_progress
            .iter()
            .map(|(slug, title, step, total, percent, complete)| {
                serde_json::json!({
                    "slug": slug,
                    "title": title,
                    "current_step": step,
                    "total_steps": total,
                    "percent_complete": percent,
                    "is_complete": complete,
                })
            })
            .collect();
        let status = serde_json::json!({
            "status": "initialized",
            "viewer": ctx.viewer.id.as_str(),
            "chains": chains.len(),
            "prompts": prompt_count,
            "balance": balance,
            "progress": progress,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("promptshelf Status");
    println!("══════════════════════════════════════");
    println!("Viewer:  {}", ctx.viewer.id);
    println!("Chains:  {}", chains.len());
    println!("Prompts: {}", prompt_count);
    println!("Credits: {}", balance);
    println!();

    if in_progress.is_empty() {
        println!("No chains in progress.");
    } else {
        println!("In progress:");
        for (slug, title, step, total, percent, complete) in &in_progress {
            let position = if *complete {
                "done".to_string()
            } else {
                format!("step {}/{}", step, total)
            };
            println!(
                "  {} {:>3}%  {:<24} {} ({})",
                render_progress_bar(*percent, PROGRESS_BAR_WIDTH / 2),
                percent,
                slug,
                title,
                position
            );
        }
    }

    Ok(())
}
