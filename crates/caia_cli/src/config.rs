//! CLI configuration.
//!
//! Loaded from TOML. The first file found wins:
//! 1. `--config <path>`
//! 2. `./caia.toml`
//! 3. `<config_dir>/caia/config.toml`
//!
//! With no file, defaults apply. `CAIA_DB_PATH` and `--db-path` then
//! override the database path, in that order.

use std::path::{Path, PathBuf};

use caia_db::DbConfig;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "CAIA_DB_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaiaConfig {
    pub database: DbConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Write a daily-rotated log file here as well as to the terminal
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "caia_db=info,caia_cli=info,warn".to_string(),
            directory: None,
        }
    }
}

/// Candidate config files, most specific first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("caia.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("caia").join("config.toml"));
    }

    paths
}

/// Load configuration from a specific file.
pub async fn load_config(path: &Path) -> Result<CaiaConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;

    let mut config: CaiaConfig = toml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;

    // Relative database paths are relative to the config file
    if config.database.path.is_relative() {
        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.database.path = base_dir.join(&config.database.path);
    }

    Ok(config)
}

/// Load configuration from the first standard location that exists.
pub async fn load_config_from_standard_locations() -> Result<CaiaConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    Ok(CaiaConfig::default())
}

/// Save configuration as TOML, creating the parent directory.
pub async fn save_config(config: &CaiaConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.into_diagnostic()?;
        }
    }

    let content = toml::to_string_pretty(config).into_diagnostic()?;
    tokio::fs::write(path, content)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

impl CaiaConfig {
    /// Apply the environment and command line database path overrides.
    pub fn with_overrides(mut self, env_db_path: Option<PathBuf>, cli_db_path: Option<PathBuf>) -> Self {
        if let Some(path) = cli_db_path.or(env_db_path) {
            self.database.path = path;
        }
        self
    }
}

/// Resolve the full configuration for a CLI invocation.
pub async fn resolve(config_path: Option<&Path>, cli_db_path: Option<PathBuf>) -> Result<CaiaConfig> {
    let config = match config_path {
        Some(path) => load_config(path).await?,
        None => load_config_from_standard_locations().await?,
    };
    let env_db_path = std::env::var_os(DB_PATH_ENV).map(PathBuf::from);
    Ok(config.with_overrides(env_db_path, cli_db_path))
}
