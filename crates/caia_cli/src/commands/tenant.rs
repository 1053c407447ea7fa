//! Tenant commands: registration, installs, overrides and resolution

use caia_db::{CaiaDb, Json, MemoryOverride, MemoryTenant, queries};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::helpers::{format_tags, parse_tags};
use crate::output::Output;

/// Register a tenant
pub async fn add(db: &CaiaDb, name: &str, brand_slug: &str, output: &Output) -> Result<()> {
    let tenant = MemoryTenant::new(name, brand_slug);
    queries::create_tenant(db.pool(), &tenant).await?;

    output.success(&format!("Created tenant {}", tenant.brand_slug.bright_cyan()));
    output.kv("ID", &tenant.id);
    Ok(())
}

/// List tenants with install counts
pub async fn list(db: &CaiaDb, output: &Output) -> Result<()> {
    let tenants = queries::list_tenants(db.pool()).await?;
    if tenants.is_empty() {
        output.info(
            "No tenants found",
            "Create one with: caia tenant add <name> <brand-slug>",
        );
        return Ok(());
    }

    for tenant in tenants {
        let installs = queries::list_installs_for_tenant(db.pool(), &tenant.id).await?;
        output.info("•", &tenant.brand_slug.bright_cyan().to_string());
        output.kv("  Name", &tenant.name);
        output.kv("  ID", &tenant.id);
        output.kv("  Installed packs", &installs.len().to_string());
        output.status("");
    }
    Ok(())
}

/// Install a pack for a tenant
pub async fn install(db: &CaiaDb, brand_slug: &str, pack_id: &str, output: &Output) -> Result<()> {
    let tenant = queries::require_tenant_by_brand_slug(db.pool(), brand_slug).await?;
    let pack = queries::require_pack(db.pool(), pack_id).await?;
    queries::install_pack(db.pool(), &tenant.id, &pack.id).await?;

    output.success(&format!(
        "Installed {} {} for {}",
        pack.slug.bright_cyan(),
        pack.version,
        tenant.brand_slug.bold()
    ));
    Ok(())
}

/// Remove a pack from a tenant
pub async fn uninstall(
    db: &CaiaDb,
    brand_slug: &str,
    pack_id: &str,
    output: &Output,
) -> Result<()> {
    let tenant = queries::require_tenant_by_brand_slug(db.pool(), brand_slug).await?;
    if queries::uninstall_pack(db.pool(), &tenant.id, pack_id).await? {
        output.success(&format!("Uninstalled pack {pack_id}"));
    } else {
        output.warning(&format!("Pack {pack_id} was not installed"));
    }
    Ok(())
}

/// Set (or replace) a tenant's override for a pack item
pub async fn set_override(
    db: &CaiaDb,
    brand_slug: &str,
    item_id: &str,
    content: &str,
    tags: Option<&str>,
    output: &Output,
) -> Result<()> {
    let tenant = queries::require_tenant_by_brand_slug(db.pool(), brand_slug).await?;
    let mut ov = MemoryOverride::new(&tenant.id, item_id, content);
    if tags.is_some() {
        ov.tags = Some(Json(parse_tags(tags)));
    }
    let stored = queries::upsert_override(db.pool(), &ov).await?;

    output.success(&format!("Override saved for item {item_id}"));
    output.kv("ID", &stored.id);
    Ok(())
}

/// Remove a tenant's override for a pack item
pub async fn clear_override(
    db: &CaiaDb,
    brand_slug: &str,
    item_id: &str,
    output: &Output,
) -> Result<()> {
    let tenant = queries::require_tenant_by_brand_slug(db.pool(), brand_slug).await?;
    if queries::delete_override(db.pool(), &tenant.id, item_id).await? {
        output.success(&format!("Override removed for item {item_id}"));
    } else {
        output.warning(&format!("No override for item {item_id}"));
    }
    Ok(())
}

/// Show a tenant's effective items with overrides applied
pub async fn resolve(db: &CaiaDb, brand_slug: &str, json: bool, output: &Output) -> Result<()> {
    let tenant = queries::require_tenant_by_brand_slug(db.pool(), brand_slug).await?;
    let items = queries::resolve_tenant_items(db.pool(), &tenant.id).await?;

    if json {
        output.print(&serde_json::to_string_pretty(&items).into_diagnostic()?);
        return Ok(());
    }

    output.section(&format!("{} ({} items)", tenant.brand_slug, items.len()));
    for item in items {
        let marker = if item.overridden {
            "overridden".yellow().to_string()
        } else {
            "pack".dimmed().to_string()
        };
        output.info(
            "•",
            &format!(
                "{}@{} [{}] {}",
                item.pack_slug.bright_cyan(),
                item.pack_version,
                item.kind,
                marker
            ),
        );
        if let Some(subject) = &item.subject {
            output.kv("  Subject", subject);
        }
        output.kv("  Content", &item.content);
        let tags = item.tags.map(|t| t.0).unwrap_or_default();
        output.kv("  Tags", &format_tags(&tags));
    }
    Ok(())
}
