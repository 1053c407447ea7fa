//! Scoped key/value memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A JSON value stored under (scope, key).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CaiaMemory {
    pub id: String,
    pub scope: String,
    pub key: String,
    pub value: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaiaMemory {
    pub fn new(scope: impl Into<String>, key: impl Into<String>, value: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            scope: scope.into(),
            key: key.into(),
            value: Json(value),
            created_at: now,
            updated_at: now,
        }
    }
}
