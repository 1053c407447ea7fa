//! Shared helper functions for CLI commands
//!
//! - `get_db()` - Opens the database described by the config
//! - `parse_tags()` - Splits a comma-separated tag list
//! - `parse_value()` - Reads a KV value as JSON, falling back to a string

use caia_db::CaiaDb;
use miette::{Result, WrapErr};

use crate::config::CaiaConfig;

/// Open the database described by the config.
///
/// Creates the file and runs migrations if needed.
pub async fn get_db(config: &CaiaConfig) -> Result<CaiaDb> {
    CaiaDb::open_with(&config.database)
        .await
        .wrap_err_with(|| {
            format!(
                "Failed to open database at {}",
                config.database.path.display()
            )
        })
}

/// Split `"a, b,,c"` into `["a", "b", "c"]`.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse a value as JSON; anything that isn't valid JSON is stored as a string.
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Render tags for display.
pub fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(", ")
    }
}
