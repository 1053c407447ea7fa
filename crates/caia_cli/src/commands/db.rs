//! Database inspection and maintenance commands

use caia_db::CaiaDb;
use caia_db::queries;
use miette::Result;
use owo_colors::OwoColorize;

use crate::config::CaiaConfig;
use crate::output::Output;

/// Show row counts and the busiest tenants
pub async fn stats(db: &CaiaDb, config: &CaiaConfig, output: &Output) -> Result<()> {
    let stats = db.stats().await?;

    output.section("Database");
    output.kv("Path", &config.database.path.display().to_string());
    if let Ok(meta) = std::fs::metadata(&config.database.path) {
        output.kv("Size", &format!("{} KiB", meta.len() / 1024));
    }

    output.section("Rows");
    output.kv("Users", &stats.user_count.to_string());
    output.kv("Messages", &stats.message_count.to_string());
    output.kv("Tasks", &stats.task_count.to_string());
    output.kv("Vendors", &stats.vendor_count.to_string());
    output.kv("Packs", &stats.pack_count.to_string());
    output.kv("Pack items", &stats.pack_item_count.to_string());
    output.kv("Tenants", &stats.tenant_count.to_string());
    output.kv("Installs", &stats.install_count.to_string());
    output.kv("Overrides", &stats.override_count.to_string());
    output.kv("Learned", &stats.learned_memory_count.to_string());
    output.kv("KV entries", &stats.caia_memory_count.to_string());

    let busiest = queries::get_busiest_tenants(db.pool(), 5).await?;
    if !busiest.is_empty() {
        output.section("Most learned memories");
        for (tenant_id, count) in busiest {
            output.list_item(&format!("{} ({count})", tenant_id.bright_cyan()));
        }
    }

    Ok(())
}

/// Checkpoint the WAL and reclaim free pages
pub async fn vacuum(db: &CaiaDb, output: &Output) -> Result<()> {
    db.checkpoint().await?;
    db.vacuum().await?;
    output.success("Database vacuumed");
    Ok(())
}

/// Run integrity and foreign key checks
pub async fn check(db: &CaiaDb, output: &Output) -> Result<()> {
    let problems = db.integrity_check().await?;
    if problems.is_empty() {
        output.success("No problems found");
        return Ok(());
    }

    output.warning(&format!("{} problem(s) found:", problems.len()));
    for problem in &problems {
        output.error(problem);
    }
    Err(miette::miette!("Database check failed"))
}
