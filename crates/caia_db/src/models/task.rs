//! Workfocus task models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A task or work item.
///
/// Tasks live in a named bucket ("inbox", "today", ...) and may be
/// unowned. Status is stored as free text so buckets can carry their own
/// workflow; [`TaskStatus`] names the values this crate treats specially.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkfocusTask {
    /// Unique identifier
    pub id: String,

    /// Owning user (None = unassigned)
    pub owner_id: Option<String>,

    /// Grouping bucket
    pub bucket: String,

    /// Task title (short, actionable)
    pub title: String,

    /// Current status
    pub status: String,

    /// When the task is due
    pub due_at: Option<DateTime<Utc>>,

    /// Arbitrary task metadata
    pub metadata: Option<Json<serde_json::Value>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl WorkfocusTask {
    pub fn new(bucket: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: super::new_id(),
            owner_id: None,
            bucket: bucket.into(),
            title: title.into(),
            status: TaskStatus::Open.as_str().to_string(),
            due_at: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Well-known task statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}
