//! Scoped key/value commands

use caia_db::{CaiaDb, queries};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::helpers::parse_value;
use crate::output::Output;

pub async fn get(db: &CaiaDb, scope: &str, key: &str, output: &Output) -> Result<()> {
    let entry = queries::get_caia_memory(db.pool(), scope, key)
        .await?
        .ok_or_else(|| miette::miette!("No value stored under {}/{}", scope, key))?;
    output.print(&serde_json::to_string_pretty(&entry.value.0).into_diagnostic()?);
    Ok(())
}

pub async fn set(db: &CaiaDb, scope: &str, key: &str, raw: &str, output: &Output) -> Result<()> {
    let value = parse_value(raw);
    let entry = queries::set_caia_memory(db.pool(), scope, key, &value).await?;
    output.success(&format!("Stored {}/{}", entry.scope, entry.key.bright_cyan()));
    Ok(())
}

pub async fn list(db: &CaiaDb, scope: &str, output: &Output) -> Result<()> {
    let entries = queries::list_caia_scope(db.pool(), scope).await?;
    if entries.is_empty() {
        output.status(&format!("Scope {scope} is empty"));
        return Ok(());
    }

    output.section(&format!("{scope} ({} keys)", entries.len()));
    for entry in entries {
        output.kv(&entry.key, &entry.value.0.to_string());
    }
    Ok(())
}

/// Delete one key, or the whole scope when no key is given
pub async fn delete(db: &CaiaDb, scope: &str, key: Option<&str>, output: &Output) -> Result<()> {
    match key {
        Some(key) => {
            if queries::delete_caia_memory(db.pool(), scope, key).await? {
                output.success(&format!("Deleted {scope}/{key}"));
            } else {
                output.warning(&format!("Nothing stored under {scope}/{key}"));
            }
        }
        None => {
            let removed = queries::delete_caia_scope(db.pool(), scope).await?;
            output.success(&format!("Deleted {removed} keys from {scope}"));
        }
    }
    Ok(())
}
