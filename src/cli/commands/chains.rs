//! Chain Catalog Commands
//!
//! Usage:
//!   promptshelf list [--search s] [--all] [-f json]
//!   promptshelf show <slug> [-f json]
//!   promptshelf delete <slug>

use crate::cli::CommandContext;
use crate::runner::extract_variables;
use crate::storage::{ChainFilter, ProgressStore};
use crate::types::Result;

pub fn list(search: Option<String>, all: bool, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let filter = ChainFilter {
        search,
        published_only: !all,
        author: None,
    };
    let chains = ctx.catalog().list_chains(&filter, &ctx.viewer)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&chains)?);
        return Ok(());
    }

    if chains.is_empty() {
        println!("No chains found. Run 'promptshelf import <file>' to add one.");
        return Ok(());
    }

    for chain in &chains {
        let price = if chain.is_premium {
            format!("{} credits", chain.price_credits)
        } else {
            "free".to_string()
        };
        let draft = if chain.is_published { "" } else { " [draft]" };
        println!(
            "{:<30} {:<40} {:>3} steps  {}{}",
            chain.slug, chain.title, chain.step_count, price, draft
        );
    }
    println!();
    println!("{} chain(s)", chains.len());

    Ok(())
}

pub fn show(slug: &str, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();
    let chain = catalog.get_chain(slug)?;
    let access = catalog.resolve_access(&ctx.viewer, &chain)?;

    if format == "json" {
        let steps: Vec<_> = chain
            .steps
            .iter()
            .map(|step| {
                serde_json::json!({
                    "position": step.position,
                    "title": step.display_title(),
                    "estimated_minutes": step.estimated_minutes,
                })
            })
            .collect();
        let output = serde_json::json!({
            "id": chain.id,
            "slug": chain.slug,
            "title": chain.title,
            "description": chain.description,
            "author": chain.author_id,
            "is_premium": chain.is_premium,
            "price_credits": chain.price_credits,
            "is_published": chain.is_published,
            "access": access.to_string(),
            "steps": steps,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", chain.title);
    println!("══════════════════════════════════════");
    if let Some(description) = &chain.description {
        println!("{}", description);
        println!();
    }
    println!("Slug:   {}", chain.slug);
    println!("Author: {}", chain.author_id);
    if chain.is_premium {
        println!("Price:  {} credits", chain.price_credits);
    }
    println!("Access: {}", access);
    println!();

    let total_minutes: u32 = chain.steps.iter().filter_map(|s| s.estimated_minutes).sum();
    println!(
        "Steps ({}{}):",
        chain.step_count(),
        if total_minutes > 0 {
            format!(", ~{} min", total_minutes)
        } else {
            String::new()
        }
    );
    for step in &chain.steps {
        let vars = if access.has_access() {
            let names = extract_variables(&step.prompt.prompt_text);
            if names.is_empty() {
                String::new()
            } else {
                format!("  [{}]", names.join(", "))
            }
        } else {
            String::new()
        };
        println!("  {:>2}. {}{}", step.position, step.display_title(), vars);
    }

    if !access.has_access() {
        println!();
        println!(
            "🔒 Premium chain. Run 'promptshelf purchase {}' to unlock.",
            chain.slug
        );
    }

    Ok(())
}

pub fn delete(slug: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let chain = ctx.catalog().get_chain(slug)?;
    ctx.catalog().delete_chain(slug, &ctx.viewer)?;

    ctx.progress_store().clear(&chain.id);

    println!("✓ Deleted chain '{}'", slug);
    Ok(())
}
