//! Pack manifests: the portable JSON form of a memory pack.
//!
//! ```json
//! {
//!   "vendor": { "name": "Acme" },
//!   "pack": { "slug": "faq", "version": "1.0.0", "title": "Store FAQ" },
//!   "items": [{ "kind": "faq", "subject": "hours", "content": "9 to 5" }]
//! }
//! ```

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::info;

use crate::digest::{DigestItem, pack_digest};
use crate::error::{DbError, DbResult};
use crate::models::{MemoryPack, MemoryPackItem, MemoryVendor};
use crate::queries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub vendor: VendorManifest,
    pub pack: PackHeader,
    #[serde(default)]
    pub items: Vec<ItemManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackHeader {
    pub slug: String,
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Expected digest of the pack contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemManifest {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl<'a> From<&'a ItemManifest> for DigestItem<'a> {
    fn from(item: &'a ItemManifest) -> Self {
        Self {
            kind: &item.kind,
            subject: item.subject.as_deref(),
            content: &item.content,
            tags: &item.tags,
        }
    }
}

impl PackManifest {
    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the manifest as pretty JSON.
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Digest of the manifest's pack coordinates and items.
    pub fn digest(&self) -> String {
        pack_digest(
            &self.pack.slug,
            &self.pack.version,
            self.items.iter().map(DigestItem::from),
        )
    }
}

/// Rows written by [`import_manifest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPack {
    pub vendor_id: String,
    pub pack_id: String,
    pub item_count: usize,
    /// Whether the vendor row was created by this import
    pub created_vendor: bool,
}

/// Import a manifest in a single transaction.
///
/// Reuses the first vendor with a matching name. A manifest signature
/// must match the computed digest; on mismatch nothing is written.
pub async fn import_manifest(pool: &SqlitePool, manifest: &PackManifest) -> DbResult<ImportedPack> {
    let digest = manifest.digest();
    if let Some(expected) = &manifest.pack.signature {
        if *expected != digest {
            return Err(DbError::SignatureMismatch {
                expected: expected.clone(),
                actual: digest,
            });
        }
    }

    let mut tx = pool.begin().await?;

    let (vendor_id, created_vendor) =
        match queries::find_vendor_by_name(&mut *tx, &manifest.vendor.name).await? {
            Some(vendor) => (vendor.id, false),
            None => {
                let mut vendor = MemoryVendor::new(&manifest.vendor.name);
                vendor.website = manifest.vendor.website.clone();
                queries::create_vendor(&mut *tx, &vendor).await?;
                (vendor.id, true)
            }
        };

    let mut pack = MemoryPack::new(
        &vendor_id,
        &manifest.pack.slug,
        &manifest.pack.version,
        &manifest.pack.title,
    );
    pack.notes = manifest.pack.notes.clone();
    pack.signature = manifest.pack.signature.clone();
    queries::create_pack(&mut *tx, &pack).await?;

    // Items list by creation time, so step it to keep manifest order.
    for (position, entry) in (0_i64..).zip(&manifest.items) {
        let mut item = MemoryPackItem::new(&pack.id, &entry.kind, &entry.content);
        item.created_at = pack.created_at + TimeDelta::microseconds(position);
        item.subject = entry.subject.clone();
        if !entry.tags.is_empty() {
            item.tags = Some(Json(entry.tags.clone()));
        }
        queries::create_pack_item(&mut *tx, &item).await?;
    }

    tx.commit().await?;

    info!(
        pack_id = %pack.id,
        slug = %pack.slug,
        version = %pack.version,
        items = manifest.items.len(),
        "imported pack manifest"
    );

    Ok(ImportedPack {
        vendor_id,
        pack_id: pack.id,
        item_count: manifest.items.len(),
        created_vendor,
    })
}

/// Build a manifest from a stored pack.
pub async fn export_pack(pool: &SqlitePool, pack_id: &str) -> DbResult<PackManifest> {
    let pack = queries::require_pack(pool, pack_id).await?;
    let vendor = queries::get_vendor(pool, &pack.vendor_id)
        .await?
        .ok_or_else(|| DbError::not_found("memory vendor", &pack.vendor_id))?;
    let items = queries::list_pack_items(pool, pack_id, None).await?;

    Ok(PackManifest {
        vendor: VendorManifest {
            name: vendor.name,
            website: vendor.website,
        },
        pack: PackHeader {
            slug: pack.slug,
            version: pack.version,
            title: pack.title,
            notes: pack.notes,
            signature: pack.signature,
        },
        items: items
            .into_iter()
            .map(|item| ItemManifest {
                kind: item.kind,
                subject: item.subject,
                content: item.content,
                tags: item.tags.map(|t| t.0).unwrap_or_default(),
            })
            .collect(),
    })
}
