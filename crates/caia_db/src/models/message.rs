//! Message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// An inbound or outbound communication record.
///
/// Messages are grouped by `thread_id` and carry the channel they
/// arrived on (sms, email, web, ...). The sender is optional: inbound
/// messages from unknown parties have no user attached.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CimsMessage {
    /// Unique identifier
    pub id: String,

    /// Conversation thread
    pub thread_id: String,

    /// Transport channel name
    pub channel: String,

    /// Direction relative to us
    pub direction: MessageDirection,

    /// Message text
    pub body: String,

    /// Attached media location
    pub media_url: Option<String>,

    /// Channel-specific metadata
    pub metadata: Option<Json<serde_json::Value>>,

    /// Sending user, when known
    pub sender_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl CimsMessage {
    pub fn new(
        thread_id: impl Into<String>,
        channel: impl Into<String>,
        direction: MessageDirection,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            thread_id: thread_id.into(),
            channel: channel.into(),
            direction,
            body: body.into(),
            media_url: None,
            metadata: None,
            sender_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Message direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    /// Received from the outside world
    Inbound,
    /// Sent by us
    Outbound,
}

impl MessageDirection {
    /// Returns the lowercase string representation matching the database format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl std::fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" | "in" => Ok(Self::Inbound),
            "outbound" | "out" => Ok(Self::Outbound),
            other => Err(format!("unknown message direction: {other}")),
        }
    }
}
