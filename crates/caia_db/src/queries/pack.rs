//! Vendor, pack and pack item queries.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::models::{MemoryPack, MemoryPackItem, MemoryVendor};
use crate::validate;

// ============================================================================
// Vendors
// ============================================================================

/// Create a new vendor.
pub async fn create_vendor<'e, E>(executor: E, vendor: &MemoryVendor) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    validate::non_empty("vendor name", &vendor.name)?;

    sqlx::query("INSERT INTO memory_vendors (id, name, website, created_at) VALUES (?, ?, ?, ?)")
        .bind(&vendor.id)
        .bind(&vendor.name)
        .bind(&vendor.website)
        .bind(vendor.created_at)
        .execute(executor)
        .await?;
    Ok(())
}

/// Get a vendor by ID.
pub async fn get_vendor(pool: &SqlitePool, id: &str) -> DbResult<Option<MemoryVendor>> {
    let vendor = sqlx::query_as::<_, MemoryVendor>(
        "SELECT id, name, website, created_at FROM memory_vendors WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(vendor)
}

/// Find the oldest vendor with the given name.
///
/// Vendor names are not unique; the first registered one wins.
pub async fn find_vendor_by_name<'e, E>(executor: E, name: &str) -> DbResult<Option<MemoryVendor>>
where
    E: SqliteExecutor<'e>,
{
    let vendor = sqlx::query_as::<_, MemoryVendor>(
        r#"
        SELECT id, name, website, created_at FROM memory_vendors
        WHERE name = ? ORDER BY created_at ASC, id ASC LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;
    Ok(vendor)
}

/// List all vendors by name.
pub async fn list_vendors(pool: &SqlitePool) -> DbResult<Vec<MemoryVendor>> {
    let vendors = sqlx::query_as::<_, MemoryVendor>(
        "SELECT id, name, website, created_at FROM memory_vendors ORDER BY name, created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(vendors)
}

/// Update a vendor's name and website.
pub async fn update_vendor(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    website: Option<&str>,
) -> DbResult<bool> {
    validate::non_empty("vendor name", name)?;
    let result = sqlx::query("UPDATE memory_vendors SET name = ?, website = ? WHERE id = ?")
        .bind(name)
        .bind(website)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a vendor and, via CASCADE, its packs.
pub async fn delete_vendor(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM memory_vendors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Packs
// ============================================================================

/// Create a new pack.
///
/// Fails with [`DbError::UniqueViolation`] if the vendor already has a
/// pack with the same slug and version.
pub async fn create_pack<'e, E>(executor: E, pack: &MemoryPack) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    validate::slug("pack slug", &pack.slug)?;
    validate::non_empty("pack version", &pack.version)?;
    validate::non_empty("pack title", &pack.title)?;

    sqlx::query(
        r#"
        INSERT INTO memory_packs (id, vendor_id, slug, version, title, notes, signature, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pack.id)
    .bind(&pack.vendor_id)
    .bind(&pack.slug)
    .bind(&pack.version)
    .bind(&pack.title)
    .bind(&pack.notes)
    .bind(&pack.signature)
    .bind(pack.created_at)
    .execute(executor)
    .await?;
    debug!(pack_id = %pack.id, slug = %pack.slug, version = %pack.version, "created pack");
    Ok(())
}

/// Get a pack by ID.
pub async fn get_pack(pool: &SqlitePool, id: &str) -> DbResult<Option<MemoryPack>> {
    let pack = sqlx::query_as::<_, MemoryPack>(
        r#"
        SELECT id, vendor_id, slug, version, title, notes, signature, created_at
        FROM memory_packs WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(pack)
}

/// Get a pack by ID, failing if missing.
pub async fn require_pack(pool: &SqlitePool, id: &str) -> DbResult<MemoryPack> {
    get_pack(pool, id)
        .await?
        .ok_or_else(|| DbError::not_found("memory pack", id))
}

/// Get a pack by its unique (vendor, slug, version) coordinates.
pub async fn get_pack_by_coordinates(
    pool: &SqlitePool,
    vendor_id: &str,
    slug: &str,
    version: &str,
) -> DbResult<Option<MemoryPack>> {
    let pack = sqlx::query_as::<_, MemoryPack>(
        r#"
        SELECT id, vendor_id, slug, version, title, notes, signature, created_at
        FROM memory_packs WHERE vendor_id = ? AND slug = ? AND version = ?
        "#,
    )
    .bind(vendor_id)
    .bind(slug)
    .bind(version)
    .fetch_optional(pool)
    .await?;
    Ok(pack)
}

/// List a vendor's packs.
pub async fn list_packs_for_vendor(pool: &SqlitePool, vendor_id: &str) -> DbResult<Vec<MemoryPack>> {
    let packs = sqlx::query_as::<_, MemoryPack>(
        r#"
        SELECT id, vendor_id, slug, version, title, notes, signature, created_at
        FROM memory_packs WHERE vendor_id = ? ORDER BY slug, created_at DESC
        "#,
    )
    .bind(vendor_id)
    .fetch_all(pool)
    .await?;
    Ok(packs)
}

/// All versions of one pack, newest first.
pub async fn list_pack_versions(
    pool: &SqlitePool,
    vendor_id: &str,
    slug: &str,
) -> DbResult<Vec<MemoryPack>> {
    let packs = sqlx::query_as::<_, MemoryPack>(
        r#"
        SELECT id, vendor_id, slug, version, title, notes, signature, created_at
        FROM memory_packs WHERE vendor_id = ? AND slug = ? ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(vendor_id)
    .bind(slug)
    .fetch_all(pool)
    .await?;
    Ok(packs)
}

/// Set or clear a pack's signature.
pub async fn set_pack_signature(
    pool: &SqlitePool,
    id: &str,
    signature: Option<&str>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE memory_packs SET signature = ? WHERE id = ?")
        .bind(signature)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a pack along with its items, installs and overrides.
pub async fn delete_pack(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM memory_packs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Pack items
// ============================================================================

/// Create a new pack item. The pack must exist.
pub async fn create_pack_item<'e, E>(executor: E, item: &MemoryPackItem) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    validate::non_empty("item kind", &item.kind)?;
    validate::non_empty("item content", &item.content)?;

    sqlx::query(
        r#"
        INSERT INTO memory_pack_items (id, pack_id, kind, subject, content, tags, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.pack_id)
    .bind(&item.kind)
    .bind(&item.subject)
    .bind(&item.content)
    .bind(&item.tags)
    .bind(item.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Get a pack item by ID.
pub async fn get_pack_item(pool: &SqlitePool, id: &str) -> DbResult<Option<MemoryPackItem>> {
    let item = sqlx::query_as::<_, MemoryPackItem>(
        r#"
        SELECT id, pack_id, kind, subject, content, tags, created_at
        FROM memory_pack_items WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// List a pack's items in insertion order, optionally of one kind.
pub async fn list_pack_items<'e, E>(
    executor: E,
    pack_id: &str,
    kind: Option<&str>,
) -> DbResult<Vec<MemoryPackItem>>
where
    E: SqliteExecutor<'e>,
{
    let items = sqlx::query_as::<_, MemoryPackItem>(
        r#"
        SELECT id, pack_id, kind, subject, content, tags, created_at
        FROM memory_pack_items
        WHERE pack_id = ? AND (? IS NULL OR kind = ?)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(pack_id)
    .bind(kind)
    .bind(kind)
    .fetch_all(executor)
    .await?;
    Ok(items)
}

/// Replace a pack item's content.
pub async fn update_pack_item_content(
    pool: &SqlitePool,
    id: &str,
    content: &str,
) -> DbResult<bool> {
    validate::non_empty("item content", content)?;
    let result = sqlx::query("UPDATE memory_pack_items SET content = ? WHERE id = ?")
        .bind(content)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a pack item and its overrides.
pub async fn delete_pack_item(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM memory_pack_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count a pack's items.
pub async fn count_pack_items(pool: &SqlitePool, pack_id: &str) -> DbResult<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM memory_pack_items WHERE pack_id = ?")
            .bind(pack_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaiaDb;

    async fn setup_vendor(db: &CaiaDb) -> MemoryVendor {
        let vendor = MemoryVendor::new("Acme Knowledge");
        create_vendor(db.pool(), &vendor).await.unwrap();
        vendor
    }

    #[tokio::test]
    async fn test_duplicate_pack_coordinates_rejected() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let vendor = setup_vendor(&db).await;

        let first = MemoryPack::new(&vendor.id, "s", "1.0", "Starter");
        create_pack(db.pool(), &first).await.unwrap();

        let again = MemoryPack::new(&vendor.id, "s", "1.0", "Starter again");
        let err = create_pack(db.pool(), &again).await.unwrap_err();
        match err {
            DbError::UniqueViolation { table, fields } => {
                assert_eq!(table, "memory_packs");
                assert_eq!(fields, vec!["vendor_id", "slug", "version"]);
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        // A new version of the same slug is fine
        let mut next = MemoryPack::new(&vendor.id, "s", "1.1", "Starter");
        next.created_at = first.created_at + chrono::TimeDelta::seconds(5);
        create_pack(db.pool(), &next).await.unwrap();
        let mut older = MemoryPack::new(&vendor.id, "s", "0.9", "Starter");
        older.created_at = first.created_at - chrono::TimeDelta::seconds(5);
        create_pack(db.pool(), &older).await.unwrap();

        let versions = list_pack_versions(db.pool(), &vendor.id, "s").await.unwrap();
        let labels: Vec<_> = versions.iter().map(|p| p.version.as_str()).collect();
        assert_eq!(labels, vec!["1.1", "1.0", "0.9"]);
    }

    #[tokio::test]
    async fn test_same_slug_different_vendor_allowed() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let a = setup_vendor(&db).await;
        let b = MemoryVendor::new("Other Co");
        create_vendor(db.pool(), &b).await.unwrap();

        create_pack(db.pool(), &MemoryPack::new(&a.id, "s", "1.0", "A"))
            .await
            .unwrap();
        create_pack(db.pool(), &MemoryPack::new(&b.id, "s", "1.0", "B"))
            .await
            .unwrap();

        let found = get_pack_by_coordinates(db.pool(), &b.id, "s", "1.0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "B");
    }

    #[tokio::test]
    async fn test_pack_requires_vendor() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let orphan = MemoryPack::new("no-such-vendor", "s", "1.0", "Orphan");
        let err = create_pack(db.pool(), &orphan).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let vendor = setup_vendor(&db).await;
        let err = create_pack(db.pool(), &MemoryPack::new(&vendor.id, "Bad Slug", "1.0", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));
    }

    #[tokio::test]
    async fn test_items_and_cascade() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let vendor = setup_vendor(&db).await;
        let pack = MemoryPack::new(&vendor.id, "faq", "1.0", "FAQ");
        create_pack(db.pool(), &pack).await.unwrap();

        let hours = MemoryPackItem::new(&pack.id, "faq", "We open at 9")
            .with_subject("hours")
            .with_tags(vec!["store".into()]);
        let style = MemoryPackItem::new(&pack.id, "style", "Be concise");
        create_pack_item(db.pool(), &hours).await.unwrap();
        create_pack_item(db.pool(), &style).await.unwrap();

        assert_eq!(count_pack_items(db.pool(), &pack.id).await.unwrap(), 2);
        let faqs = list_pack_items(db.pool(), &pack.id, Some("faq")).await.unwrap();
        assert_eq!(faqs.len(), 1);
        assert_eq!(faqs[0].tags.as_ref().unwrap().0, vec!["store".to_string()]);

        assert!(update_pack_item_content(db.pool(), &hours.id, "We open at 8")
            .await
            .unwrap());
        let fetched = get_pack_item(db.pool(), &hours.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "We open at 8");

        assert!(delete_vendor(db.pool(), &vendor.id).await.unwrap());
        assert!(get_pack(db.pool(), &pack.id).await.unwrap().is_none());
        assert!(get_pack_item(db.pool(), &hours.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_item_requires_pack() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let item = MemoryPackItem::new("no-such-pack", "faq", "orphan");
        let err = create_pack_item(db.pool(), &item).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
    }
}
