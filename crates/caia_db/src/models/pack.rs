//! Memory pack models.
//!
//! Vendors publish versioned packs, each pack is a bundle of items:
//! - [`MemoryVendor`] owns many packs
//! - [`MemoryPack`] is unique per (vendor, slug, version)
//! - [`MemoryPackItem`] is a single piece of content in a pack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A publisher of memory packs.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryVendor {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Vendor homepage
    pub website: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MemoryVendor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            website: None,
            created_at: Utc::now(),
        }
    }
}

/// A versioned content bundle from a vendor.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryPack {
    /// Unique identifier
    pub id: String,

    /// Publishing vendor
    pub vendor_id: String,

    /// URL-safe pack name, stable across versions
    pub slug: String,

    /// Version label
    pub version: String,

    /// Human-readable title
    pub title: String,

    /// Release notes
    pub notes: Option<String>,

    /// Content digest (`sha256:<hex>`) vouching for the items
    pub signature: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MemoryPack {
    pub fn new(
        vendor_id: impl Into<String>,
        slug: impl Into<String>,
        version: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            vendor_id: vendor_id.into(),
            slug: slug.into(),
            version: version.into(),
            title: title.into(),
            notes: None,
            signature: None,
            created_at: Utc::now(),
        }
    }
}

/// A single content unit inside a pack.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MemoryPackItem {
    /// Unique identifier
    pub id: String,

    /// Owning pack
    pub pack_id: String,

    /// Content kind ("fact", "faq", "style", ...)
    pub kind: String,

    /// What the item is about
    pub subject: Option<String>,

    /// Item content
    pub content: String,

    /// Optional tags as JSON array
    pub tags: Option<Json<Vec<String>>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MemoryPackItem {
    pub fn new(
        pack_id: impl Into<String>,
        kind: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            pack_id: pack_id.into(),
            kind: kind.into(),
            subject: None,
            content: content.into(),
            tags: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(Json(tags));
        self
    }
}
