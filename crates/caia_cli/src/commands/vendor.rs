//! Vendor commands

use caia_db::{CaiaDb, MemoryVendor, queries};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// Register a vendor
pub async fn add(db: &CaiaDb, name: &str, website: Option<&str>, output: &Output) -> Result<()> {
    let mut vendor = MemoryVendor::new(name);
    vendor.website = website.map(str::to_string);
    queries::create_vendor(db.pool(), &vendor).await?;

    output.success(&format!("Created vendor {}", vendor.name.bright_cyan()));
    output.kv("ID", &vendor.id);
    Ok(())
}

/// List vendors with their pack counts
pub async fn list(db: &CaiaDb, output: &Output) -> Result<()> {
    let vendors = queries::list_vendors(db.pool()).await?;
    if vendors.is_empty() {
        output.info("No vendors found", "Create one with: caia vendor add <name>");
        return Ok(());
    }

    output.status(&format!("Found {} vendor(s):", vendors.len()));
    output.status("");
    for vendor in vendors {
        let packs = queries::list_packs_for_vendor(db.pool(), &vendor.id).await?;
        output.info("•", &vendor.name.bright_cyan().to_string());
        output.kv("  ID", &vendor.id);
        if let Some(website) = &vendor.website {
            output.kv("  Website", website);
        }
        output.kv("  Packs", &packs.len().to_string());
        output.status("");
    }
    Ok(())
}
