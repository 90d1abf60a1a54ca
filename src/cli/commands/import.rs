//! Import Command
//!
//! Load chain documents (YAML or JSON) into the catalog.

use std::path::Path;

use crate::cli::CommandContext;
use crate::storage::ChainDocument;
use crate::types::Result;

pub fn run(path: &Path) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();

    let documents = ChainDocument::read_all(path)?;
    if documents.is_empty() {
        println!("No chains found in {}", path.display());
        return Ok(());
    }

    for doc in documents {
        let chain = doc.into_chain(ctx.viewer.id.as_str());
        catalog.save_chain(&chain, &ctx.viewer)?;
        println!(
            "✓ Imported '{}' ({} steps){}",
            chain.slug,
            chain.step_count(),
            if chain.is_premium {
                format!(", premium: {} credits", chain.price_credits)
            } else {
                String::new()
            }
        );
    }

    Ok(())
}
