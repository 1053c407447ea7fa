//! Content digests for memory packs.
//!
//! A digest covers a pack's slug, version and items. Items are sorted
//! before hashing so the result only depends on content, never on row ids,
//! timestamps or insertion order. Every field is length-prefixed.
//!
//! Digests are rendered as `sha256:<hex>` and stored in
//! `memory_packs.signature`.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;
use crate::models::MemoryPackItem;
use crate::queries;

/// Prefix of every rendered digest.
pub const DIGEST_PREFIX: &str = "sha256:";

/// The parts of a pack item that a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DigestItem<'a> {
    pub kind: &'a str,
    pub subject: Option<&'a str>,
    pub content: &'a str,
    pub tags: &'a [String],
}

impl<'a> From<&'a MemoryPackItem> for DigestItem<'a> {
    fn from(item: &'a MemoryPackItem) -> Self {
        Self {
            kind: &item.kind,
            subject: item.subject.as_deref(),
            content: &item.content,
            tags: item.tags.as_ref().map(|t| t.0.as_slice()).unwrap_or(&[]),
        }
    }
}

/// Outcome of [`verify_pack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackVerification {
    /// The pack carries no signature
    Unsigned,
    /// Stored signature matches the items
    Valid,
    /// Stored signature does not match the items
    Mismatch { expected: String, actual: String },
}

impl PackVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Compute the digest of a pack's coordinates and items.
pub fn pack_digest<'a>(
    slug: &str,
    version: &str,
    items: impl IntoIterator<Item = DigestItem<'a>>,
) -> String {
    let mut items: Vec<DigestItem<'a>> = items.into_iter().collect();
    items.sort();

    let mut hasher = Sha256::new();
    write_field(&mut hasher, slug.as_bytes());
    write_field(&mut hasher, version.as_bytes());
    hasher.update((items.len() as u64).to_le_bytes());

    for item in &items {
        write_field(&mut hasher, item.kind.as_bytes());
        match item.subject {
            Some(subject) => {
                hasher.update([1u8]);
                write_field(&mut hasher, subject.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        write_field(&mut hasher, item.content.as_bytes());
        hasher.update((item.tags.len() as u64).to_le_bytes());
        for tag in item.tags {
            write_field(&mut hasher, tag.as_bytes());
        }
    }

    let hash = hasher.finalize();
    let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
    format!("{DIGEST_PREFIX}{hex}")
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Compute the current digest of a stored pack.
pub async fn compute_pack_digest(pool: &SqlitePool, pack_id: &str) -> DbResult<String> {
    let pack = queries::require_pack(pool, pack_id).await?;
    let items = queries::list_pack_items(pool, pack_id, None).await?;
    Ok(pack_digest(
        &pack.slug,
        &pack.version,
        items.iter().map(DigestItem::from),
    ))
}

/// Check a stored pack's signature against its items.
pub async fn verify_pack(pool: &SqlitePool, pack_id: &str) -> DbResult<PackVerification> {
    let pack = queries::require_pack(pool, pack_id).await?;
    let Some(expected) = pack.signature else {
        return Ok(PackVerification::Unsigned);
    };

    let actual = compute_pack_digest(pool, pack_id).await?;
    if actual == expected {
        Ok(PackVerification::Valid)
    } else {
        warn!(pack_id, %expected, %actual, "pack signature mismatch");
        Ok(PackVerification::Mismatch { expected, actual })
    }
}

/// Store the pack's current digest as its signature. Returns the digest.
pub async fn sign_pack(pool: &SqlitePool, pack_id: &str) -> DbResult<String> {
    let digest = compute_pack_digest(pool, pack_id).await?;
    queries::set_pack_signature(pool, pack_id, Some(&digest)).await?;
    info!(pack_id, %digest, "signed pack");
    Ok(digest)
}
