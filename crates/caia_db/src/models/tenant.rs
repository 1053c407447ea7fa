//! Tenant models.
//!
//! A tenant is an isolated brand namespace. Tenants install packs and may
//! override individual pack items with their own content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// An isolated customer/brand namespace.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryTenant {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// URL-safe brand identifier, unique across tenants
    pub brand_slug: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MemoryTenant {
    pub fn new(name: impl Into<String>, brand_slug: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            brand_slug: brand_slug.into(),
            created_at: Utc::now(),
        }
    }
}

/// Record of a tenant having installed a pack.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryInstall {
    pub id: String,
    pub tenant_id: String,
    pub pack_id: String,
    pub installed_at: DateTime<Utc>,
}

/// Tenant-specific replacement content for a pack item.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryOverride {
    /// Unique identifier
    pub id: String,

    /// Overriding tenant
    pub tenant_id: String,

    /// Item being overridden
    pub pack_item_id: String,

    /// Replacement content
    pub content: String,

    /// Replacement tags (None keeps the item's tags)
    pub tags: Option<Json<Vec<String>>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MemoryOverride {
    pub fn new(
        tenant_id: impl Into<String>,
        pack_item_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            tenant_id: tenant_id.into(),
            pack_item_id: pack_item_id.into(),
            content: content.into(),
            tags: None,
            created_at: Utc::now(),
        }
    }
}

/// A pack item as seen by one tenant, with any override applied.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub item_id: String,
    pub pack_id: String,
    pub pack_slug: String,
    pub pack_version: String,
    pub kind: String,
    pub subject: Option<String>,

    /// Override content if present, else the item's content
    pub content: String,

    pub tags: Option<Json<Vec<String>>>,

    /// Whether `content` came from a tenant override
    pub overridden: bool,
}
