//! Database configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Connection settings for a CAIA database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl DbConfig {
    /// Config pointing at `path`, other settings default.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("caia")
                .join("caia.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DbConfig = serde_json::from_str(r#"{ "path": "/tmp/x.db" }"#).unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout_ms, 5_000);
    }
}
