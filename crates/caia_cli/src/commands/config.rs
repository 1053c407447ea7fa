use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::path::Path;

use crate::config::{self, CaiaConfig};
use crate::output::Output;

/// Show the effective configuration
pub async fn show(config: &CaiaConfig, output: &Output) -> Result<()> {
    output.section("Current Configuration");
    output.print("");

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    for line in toml_str.lines() {
        output.print(line);
    }

    Ok(())
}

/// Save the effective configuration to a file
pub async fn save(config: &CaiaConfig, path: &Path, output: &Output) -> Result<()> {
    config::save_config(config, path).await?;

    output.success(&format!("Configuration saved to {}", path.display()));
    output.status("To use this configuration, run:");
    output.status(&format!(
        "{} --config {}",
        "caia".bright_green(),
        path.display()
    ));

    Ok(())
}
