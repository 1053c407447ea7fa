//! Learned memory models.
//!
//! Learned memories are facts picked up at runtime, scoped to a tenant and
//! optionally to a user. They carry an importance score and may expire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// An adaptive per-tenant memory fact.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LearnedMemory {
    /// Unique identifier
    pub id: String,

    /// Tenant the memory belongs to
    pub tenant_id: String,

    /// User the memory is about or came from
    pub user_id: Option<String>,

    /// What sort of memory this is
    pub kind: LearnedMemoryKind,

    /// What the memory is about
    pub subject: Option<String>,

    /// Memory content
    pub content: String,

    /// Optional tags as JSON array
    pub tags: Option<Json<Vec<String>>>,

    /// Ranking weight, higher is more important
    pub importance: i64,

    /// Where the memory was learned ("chat", "import", ...)
    pub source: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last time the memory was recalled
    pub last_used_at: Option<DateTime<Utc>>,

    /// When the memory stops being valid
    pub expire_at: Option<DateTime<Utc>>,
}

impl LearnedMemory {
    pub fn new(
        tenant_id: impl Into<String>,
        kind: LearnedMemoryKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            tenant_id: tenant_id.into(),
            user_id: None,
            kind,
            subject: None,
            content: content.into(),
            tags: None,
            importance: 0,
            source: None,
            created_at: Utc::now(),
            last_used_at: None,
            expire_at: None,
        }
    }

    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }

    /// Whether the memory has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

/// Learned memory kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LearnedMemoryKind {
    /// Something true about the world or the tenant
    Fact,
    /// A stated like or dislike
    Preference,
    /// Something someone wants done
    Task,
    /// Free-form note
    Note,
    /// Who someone is
    Identity,
}

impl Default for LearnedMemoryKind {
    fn default() -> Self {
        Self::Fact
    }
}

impl LearnedMemoryKind {
    pub const ALL: [Self; 5] = [
        Self::Fact,
        Self::Preference,
        Self::Task,
        Self::Note,
        Self::Identity,
    ];

    /// Returns the lowercase string representation matching the database format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Preference => "preference",
            Self::Task => "task",
            Self::Note => "note",
            Self::Identity => "identity",
        }
    }
}

impl std::fmt::Display for LearnedMemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LearnedMemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown memory kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in LearnedMemoryKind::ALL {
            assert_eq!(kind.as_str().parse::<LearnedMemoryKind>().unwrap(), kind);
        }
        assert!("opinion".parse::<LearnedMemoryKind>().is_err());
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let memory = LearnedMemory::new("t1", LearnedMemoryKind::Note, "x");
        assert!(!memory.is_expired(now));

        let memory = memory.expiring_at(now - chrono::Duration::seconds(1));
        assert!(memory.is_expired(now));
    }
}
