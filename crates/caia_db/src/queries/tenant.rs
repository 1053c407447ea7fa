//! Tenant, install and override queries.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::models::{MemoryInstall, MemoryOverride, MemoryTenant, ResolvedItem, new_id};
use crate::validate;

// ============================================================================
// Tenants
// ============================================================================

/// Create a new tenant.
///
/// Fails with [`DbError::UniqueViolation`] if the brand slug is taken.
pub async fn create_tenant(pool: &SqlitePool, tenant: &MemoryTenant) -> DbResult<()> {
    validate::non_empty("tenant name", &tenant.name)?;
    validate::slug("brand slug", &tenant.brand_slug)?;

    sqlx::query(
        "INSERT INTO memory_tenants (id, name, brand_slug, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&tenant.id)
    .bind(&tenant.name)
    .bind(&tenant.brand_slug)
    .bind(tenant.created_at)
    .execute(pool)
    .await?;
    debug!(tenant_id = %tenant.id, brand_slug = %tenant.brand_slug, "created tenant");
    Ok(())
}

/// Get a tenant by ID.
pub async fn get_tenant(pool: &SqlitePool, id: &str) -> DbResult<Option<MemoryTenant>> {
    let tenant = sqlx::query_as::<_, MemoryTenant>(
        "SELECT id, name, brand_slug, created_at FROM memory_tenants WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(tenant)
}

/// Get a tenant by brand slug.
pub async fn get_tenant_by_brand_slug(
    pool: &SqlitePool,
    brand_slug: &str,
) -> DbResult<Option<MemoryTenant>> {
    let tenant = sqlx::query_as::<_, MemoryTenant>(
        "SELECT id, name, brand_slug, created_at FROM memory_tenants WHERE brand_slug = ?",
    )
    .bind(brand_slug)
    .fetch_optional(pool)
    .await?;
    Ok(tenant)
}

/// Get a tenant by brand slug, failing if missing.
pub async fn require_tenant_by_brand_slug(
    pool: &SqlitePool,
    brand_slug: &str,
) -> DbResult<MemoryTenant> {
    get_tenant_by_brand_slug(pool, brand_slug)
        .await?
        .ok_or_else(|| DbError::not_found("memory tenant", brand_slug))
}

/// List all tenants by brand slug.
pub async fn list_tenants(pool: &SqlitePool) -> DbResult<Vec<MemoryTenant>> {
    let tenants = sqlx::query_as::<_, MemoryTenant>(
        "SELECT id, name, brand_slug, created_at FROM memory_tenants ORDER BY brand_slug",
    )
    .fetch_all(pool)
    .await?;
    Ok(tenants)
}

/// Rename a tenant. The brand slug is immutable.
pub async fn rename_tenant(pool: &SqlitePool, id: &str, name: &str) -> DbResult<bool> {
    validate::non_empty("tenant name", name)?;
    let result = sqlx::query("UPDATE memory_tenants SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a tenant along with its installs and overrides.
pub async fn delete_tenant(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM memory_tenants WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Installs
// ============================================================================

/// Record that a tenant installed a pack.
///
/// Installing the same pack twice fails with [`DbError::UniqueViolation`];
/// an unknown tenant or pack fails with [`DbError::ForeignKeyViolation`].
pub async fn install_pack(pool: &SqlitePool, tenant_id: &str, pack_id: &str) -> DbResult<MemoryInstall> {
    let install = MemoryInstall {
        id: new_id(),
        tenant_id: tenant_id.to_string(),
        pack_id: pack_id.to_string(),
        installed_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO memory_installs (id, tenant_id, pack_id, installed_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&install.id)
    .bind(&install.tenant_id)
    .bind(&install.pack_id)
    .bind(install.installed_at)
    .execute(pool)
    .await?;
    info!(tenant_id, pack_id, "installed pack");
    Ok(install)
}

/// Remove a tenant's install of a pack. Overrides are kept.
pub async fn uninstall_pack(pool: &SqlitePool, tenant_id: &str, pack_id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM memory_installs WHERE tenant_id = ? AND pack_id = ?")
        .bind(tenant_id)
        .bind(pack_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Get the install record for a (tenant, pack) pair.
pub async fn get_install(
    pool: &SqlitePool,
    tenant_id: &str,
    pack_id: &str,
) -> DbResult<Option<MemoryInstall>> {
    let install = sqlx::query_as::<_, MemoryInstall>(
        r#"
        SELECT id, tenant_id, pack_id, installed_at
        FROM memory_installs WHERE tenant_id = ? AND pack_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(pack_id)
    .fetch_optional(pool)
    .await?;
    Ok(install)
}

/// List a tenant's installs, oldest first.
pub async fn list_installs_for_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
) -> DbResult<Vec<MemoryInstall>> {
    let installs = sqlx::query_as::<_, MemoryInstall>(
        r#"
        SELECT id, tenant_id, pack_id, installed_at
        FROM memory_installs WHERE tenant_id = ? ORDER BY installed_at ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(installs)
}

/// List the tenants that installed a pack.
pub async fn list_tenants_for_pack(pool: &SqlitePool, pack_id: &str) -> DbResult<Vec<MemoryTenant>> {
    let tenants = sqlx::query_as::<_, MemoryTenant>(
        r#"
        SELECT t.id, t.name, t.brand_slug, t.created_at
        FROM memory_tenants t
        JOIN memory_installs i ON i.tenant_id = t.id
        WHERE i.pack_id = ?
        ORDER BY t.brand_slug
        "#,
    )
    .bind(pack_id)
    .fetch_all(pool)
    .await?;
    Ok(tenants)
}

// ============================================================================
// Overrides
// ============================================================================

/// Create an override.
///
/// A second override for the same (tenant, item) pair fails with
/// [`DbError::UniqueViolation`]; use [`upsert_override`] to replace.
pub async fn create_override(pool: &SqlitePool, ov: &MemoryOverride) -> DbResult<()> {
    validate::non_empty("override content", &ov.content)?;

    sqlx::query(
        r#"
        INSERT INTO memory_overrides (id, tenant_id, pack_item_id, content, tags, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&ov.id)
    .bind(&ov.tenant_id)
    .bind(&ov.pack_item_id)
    .bind(&ov.content)
    .bind(&ov.tags)
    .bind(ov.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert an override, or replace content and tags of the existing one
/// for the same (tenant, item). Returns the stored row.
pub async fn upsert_override(pool: &SqlitePool, ov: &MemoryOverride) -> DbResult<MemoryOverride> {
    validate::non_empty("override content", &ov.content)?;

    let stored = sqlx::query_as::<_, MemoryOverride>(
        r#"
        INSERT INTO memory_overrides (id, tenant_id, pack_item_id, content, tags, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(tenant_id, pack_item_id) DO UPDATE SET
            content = excluded.content,
            tags = excluded.tags
        RETURNING id, tenant_id, pack_item_id, content, tags, created_at
        "#,
    )
    .bind(&ov.id)
    .bind(&ov.tenant_id)
    .bind(&ov.pack_item_id)
    .bind(&ov.content)
    .bind(&ov.tags)
    .bind(ov.created_at)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Get a tenant's override for an item.
pub async fn get_override(
    pool: &SqlitePool,
    tenant_id: &str,
    pack_item_id: &str,
) -> DbResult<Option<MemoryOverride>> {
    let ov = sqlx::query_as::<_, MemoryOverride>(
        r#"
        SELECT id, tenant_id, pack_item_id, content, tags, created_at
        FROM memory_overrides WHERE tenant_id = ? AND pack_item_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(pack_item_id)
    .fetch_optional(pool)
    .await?;
    Ok(ov)
}

/// List a tenant's overrides.
pub async fn list_overrides_for_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
) -> DbResult<Vec<MemoryOverride>> {
    let overrides = sqlx::query_as::<_, MemoryOverride>(
        r#"
        SELECT id, tenant_id, pack_item_id, content, tags, created_at
        FROM memory_overrides WHERE tenant_id = ? ORDER BY created_at ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(overrides)
}

/// Delete a tenant's override for an item.
pub async fn delete_override(
    pool: &SqlitePool,
    tenant_id: &str,
    pack_item_id: &str,
) -> DbResult<bool> {
    let result =
        sqlx::query("DELETE FROM memory_overrides WHERE tenant_id = ? AND pack_item_id = ?")
            .bind(tenant_id)
            .bind(pack_item_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Resolution
// ============================================================================

/// A tenant's effective items: every item of every installed pack, with
/// the tenant's override content (and tags, when set) applied.
pub async fn resolve_tenant_items(pool: &SqlitePool, tenant_id: &str) -> DbResult<Vec<ResolvedItem>> {
    let items = sqlx::query_as::<_, ResolvedItem>(
        r#"
        SELECT
            it.id AS item_id,
            p.id AS pack_id,
            p.slug AS pack_slug,
            p.version AS pack_version,
            it.kind AS kind,
            it.subject AS subject,
            COALESCE(o.content, it.content) AS content,
            COALESCE(o.tags, it.tags) AS tags,
            (o.id IS NOT NULL) AS overridden
        FROM memory_installs ins
        JOIN memory_packs p ON p.id = ins.pack_id
        JOIN memory_pack_items it ON it.pack_id = p.id
        LEFT JOIN memory_overrides o
            ON o.pack_item_id = it.id AND o.tenant_id = ins.tenant_id
        WHERE ins.tenant_id = ?
        ORDER BY p.slug ASC, p.version ASC, it.created_at ASC, it.id ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaiaDb;
    use crate::models::{MemoryPack, MemoryPackItem, MemoryVendor};
    use crate::queries::{create_pack, create_pack_item, create_vendor, delete_pack_item};
    use sqlx::types::Json;

    struct Fixture {
        db: CaiaDb,
        tenant: MemoryTenant,
        pack: MemoryPack,
        items: Vec<MemoryPackItem>,
    }

    async fn fixture() -> Fixture {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let vendor = MemoryVendor::new("Acme");
        create_vendor(db.pool(), &vendor).await.unwrap();

        let pack = MemoryPack::new(&vendor.id, "retail", "1.0", "Retail basics");
        create_pack(db.pool(), &pack).await.unwrap();

        let mut items = Vec::new();
        for (i, content) in ["Returns within 30 days", "Ships in 2 days"].iter().enumerate() {
            let mut item = MemoryPackItem::new(&pack.id, "policy", *content)
                .with_tags(vec!["policy".into()]);
            item.created_at = Utc::now() + chrono::Duration::milliseconds(i as i64);
            create_pack_item(db.pool(), &item).await.unwrap();
            items.push(item);
        }

        let tenant = MemoryTenant::new("Bob's Bikes", "bobs-bikes");
        create_tenant(db.pool(), &tenant).await.unwrap();

        Fixture {
            db,
            tenant,
            pack,
            items,
        }
    }

    #[tokio::test]
    async fn test_duplicate_brand_slug_rejected() {
        let f = fixture().await;
        let err = create_tenant(f.db.pool(), &MemoryTenant::new("Other", "bobs-bikes"))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { table, fields } => {
                assert_eq!(table, "memory_tenants");
                assert_eq!(fields, vec!["brand_slug"]);
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let f = fixture().await;
        install_pack(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap();
        let err = install_pack(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let tenants = list_tenants_for_pack(f.db.pool(), &f.pack.id).await.unwrap();
        assert_eq!(tenants, vec![f.tenant.clone()]);

        assert!(uninstall_pack(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap());
        assert!(get_install(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_install_requires_tenant_and_pack() {
        let f = fixture().await;
        let err = install_pack(f.db.pool(), "ghost", &f.pack.id)
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());

        let err = install_pack(f.db.pool(), &f.tenant.id, "ghost")
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_duplicate_override_rejected() {
        let f = fixture().await;
        let item = &f.items[0];
        create_override(
            f.db.pool(),
            &MemoryOverride::new(&f.tenant.id, &item.id, "Returns within 60 days"),
        )
        .await
        .unwrap();

        let err = create_override(
            f.db.pool(),
            &MemoryOverride::new(&f.tenant.id, &item.id, "Returns within 90 days"),
        )
        .await
        .unwrap_err();
        match err {
            DbError::UniqueViolation { table, fields } => {
                assert_eq!(table, "memory_overrides");
                assert_eq!(fields, vec!["tenant_id", "pack_item_id"]);
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        let upserted = upsert_override(
            f.db.pool(),
            &MemoryOverride::new(&f.tenant.id, &item.id, "Returns within 90 days"),
        )
        .await
        .unwrap();
        assert_eq!(upserted.content, "Returns within 90 days");
        assert_eq!(
            list_overrides_for_tenant(f.db.pool(), &f.tenant.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_override_requires_item_and_tenant() {
        let f = fixture().await;
        let err = create_override(f.db.pool(), &MemoryOverride::new(&f.tenant.id, "ghost", "x"))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());

        let err = create_override(f.db.pool(), &MemoryOverride::new("ghost", &f.items[0].id, "x"))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_resolve_applies_overrides() {
        let f = fixture().await;

        // Not installed yet: nothing resolves
        assert!(resolve_tenant_items(f.db.pool(), &f.tenant.id)
            .await
            .unwrap()
            .is_empty());

        install_pack(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap();
        let mut ov = MemoryOverride::new(&f.tenant.id, &f.items[1].id, "Ships next day");
        ov.tags = Some(Json(vec!["shipping".into()]));
        create_override(f.db.pool(), &ov).await.unwrap();

        let resolved = resolve_tenant_items(f.db.pool(), &f.tenant.id).await.unwrap();
        assert_eq!(resolved.len(), 2);

        assert_eq!(resolved[0].item_id, f.items[0].id);
        assert_eq!(resolved[0].content, "Returns within 30 days");
        assert!(!resolved[0].overridden);
        assert_eq!(resolved[0].tags.as_ref().unwrap().0, vec!["policy".to_string()]);

        assert_eq!(resolved[1].item_id, f.items[1].id);
        assert_eq!(resolved[1].content, "Ships next day");
        assert!(resolved[1].overridden);
        assert_eq!(resolved[1].tags.as_ref().unwrap().0, vec!["shipping".to_string()]);
        assert_eq!(resolved[1].pack_slug, "retail");
    }

    #[tokio::test]
    async fn test_other_tenant_unaffected_by_override() {
        let f = fixture().await;
        let other = MemoryTenant::new("Carla's Cafe", "carlas-cafe");
        create_tenant(f.db.pool(), &other).await.unwrap();

        for tenant in [&f.tenant, &other] {
            install_pack(f.db.pool(), &tenant.id, &f.pack.id)
                .await
                .unwrap();
        }
        create_override(
            f.db.pool(),
            &MemoryOverride::new(&f.tenant.id, &f.items[0].id, "Bob's returns"),
        )
        .await
        .unwrap();

        let resolved = resolve_tenant_items(f.db.pool(), &other.id).await.unwrap();
        assert!(resolved.iter().all(|item| !item.overridden));
    }

    #[tokio::test]
    async fn test_deletes_cascade() {
        let f = fixture().await;
        install_pack(f.db.pool(), &f.tenant.id, &f.pack.id)
            .await
            .unwrap();
        create_override(
            f.db.pool(),
            &MemoryOverride::new(&f.tenant.id, &f.items[0].id, "x"),
        )
        .await
        .unwrap();

        delete_pack_item(f.db.pool(), &f.items[0].id).await.unwrap();
        assert!(get_override(f.db.pool(), &f.tenant.id, &f.items[0].id)
            .await
            .unwrap()
            .is_none());

        assert!(delete_tenant(f.db.pool(), &f.tenant.id).await.unwrap());
        assert!(list_installs_for_tenant(f.db.pool(), &f.tenant.id)
            .await
            .unwrap()
            .is_empty());
    }
}
