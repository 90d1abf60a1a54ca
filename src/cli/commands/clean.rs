//! Clean Command
//!
//! Clears stored progress or removes all promptshelf data.

use std::path::Path;

use crate::cli::CommandContext;
use crate::config::PROJECT_DIR;
use crate::types::Result;

pub async fn run(all: bool, progress: bool) -> Result<()> {
    let project_dir = Path::new(PROJECT_DIR);

    if all {
        if project_dir.exists() {
            tokio::fs::remove_dir_all(project_dir).await?;
            println!("✓ Removed {}/", PROJECT_DIR);
        } else {
            println!("  Nothing to remove");
        }
        return Ok(());
    }

    if progress {
        let ctx = CommandContext::load()?;
        let store = ctx.progress_store();
        let cleared = store.clear_all();
        if cleared > 0 {
            println!("✓ Cleared progress for {} chain(s)", cleared);
        } else {
            println!("  No stored progress to clear");
        }
        return Ok(());
    }

    println!("Nothing selected. Use --progress or --all.");
    Ok(())
}
