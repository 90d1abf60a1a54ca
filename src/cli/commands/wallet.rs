//! Wallet & Purchase Commands
//!
//! Usage:
//!   promptshelf purchase <slug>
//!   promptshelf wallet [balance|credit <n>]

use crate::cli::CommandContext;
use crate::storage::PurchaseOutcome;
use crate::types::Result;

pub fn purchase(slug: &str) -> Result<()> {
    let ctx = CommandContext::load()?;

    match ctx.catalog().purchase_chain(slug, &ctx.viewer)? {
        PurchaseOutcome::NotRequired => println!("'{}' is free; no purchase needed.", slug),
        PurchaseOutcome::AlreadyOwned => println!("You are the author of '{}'.", slug),
        PurchaseOutcome::AlreadyPurchased => println!("'{}' is already unlocked.", slug),
        PurchaseOutcome::Purchased { price, balance } => {
            println!("✓ Unlocked '{}' for {} credits", slug, price);
            println!("  Balance: {} credits", balance);
        }
    }

    Ok(())
}

pub fn balance(format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.catalog();
    let balance = catalog.wallet_balance(&ctx.viewer)?;
    let purchases = catalog.purchases(&ctx.viewer)?;

    if format == "json" {
        let output = serde_json::json!({
            "viewer": ctx.viewer.id.as_str(),
            "balance": balance,
            "purchases": purchases,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Wallet: {}", ctx.viewer.id);
    println!("  Balance:   {} credits", balance);
    println!("  Purchases: {}", purchases.len());
    Ok(())
}

pub fn credit(amount: i64) -> Result<()> {
    let ctx = CommandContext::load()?;
    let balance = ctx.catalog().credit_wallet(&ctx.viewer, amount)?;
    println!("✓ Added {} credits", amount);
    println!("  Balance: {} credits", balance);
    Ok(())
}
