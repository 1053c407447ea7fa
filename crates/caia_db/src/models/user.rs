//! User models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role assigned to users created without an explicit one.
pub const DEFAULT_ROLE: &str = "member";

/// An application user.
///
/// Users are referenced as message senders, task owners and as the
/// attribution of learned memories. Deleting a user detaches those rows
/// rather than removing them.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: String,

    /// Login email, unique across users
    pub email: String,

    /// Human-readable name
    pub display_name: Option<String>,

    /// Free-form role name ("member", "admin", ...)
    pub role: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            email: email.into(),
            display_name: None,
            role: DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}
