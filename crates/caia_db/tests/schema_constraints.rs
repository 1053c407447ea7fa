//! Integration tests for the schema's uniqueness, reference and domain rules.
//!
//! Every test runs against a fresh in-memory database, going through the
//! public query API only.

use caia_db::queries::{
    create_caia_memory, create_override, create_pack, create_pack_item, create_tenant,
    create_user, create_vendor, get_pack_by_coordinates, install_pack, resolve_tenant_items,
};
use caia_db::{
    CaiaDb, CaiaMemory, DbError, MemoryOverride, MemoryPack, MemoryPackItem, MemoryTenant,
    MemoryVendor, User,
};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Seeded {
    db: CaiaDb,
    vendor: MemoryVendor,
    pack: MemoryPack,
    item: MemoryPackItem,
    tenant: MemoryTenant,
}

async fn seeded() -> Seeded {
    let db = CaiaDb::open_in_memory().await.unwrap();

    let vendor = MemoryVendor::new("V1");
    create_vendor(db.pool(), &vendor).await.unwrap();

    let pack = MemoryPack::new(&vendor.id, "S", "1.0", "Starter");
    create_pack(db.pool(), &pack).await.unwrap();

    let item = MemoryPackItem::new(&pack.id, "faq", "Shipping takes 3 days");
    create_pack_item(db.pool(), &item).await.unwrap();

    let tenant = MemoryTenant::new("Bobs Bikes", "bobs-bikes");
    create_tenant(db.pool(), &tenant).await.unwrap();

    Seeded {
        db,
        vendor,
        pack,
        item,
        tenant,
    }
}

fn unique_fields(err: DbError) -> (String, Vec<String>) {
    match err {
        DbError::UniqueViolation { table, fields } => (table, fields),
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_pack_fails_second_time() {
    let s = seeded().await;
    let again = MemoryPack::new(&s.vendor.id, "S", "1.0", "Starter copy");
    let err = create_pack(s.db.pool(), &again).await.unwrap_err();
    assert_eq!(
        unique_fields(err),
        (
            "memory_packs".to_string(),
            vec!["vendor_id".to_string(), "slug".to_string(), "version".to_string()]
        )
    );

    // slugs compare case-sensitively
    let lower = MemoryPack::new(&s.vendor.id, "s", "1.0", "Starter lowercase");
    create_pack(s.db.pool(), &lower).await.unwrap();
    let found = get_pack_by_coordinates(s.db.pool(), &s.vendor.id, "S", "1.0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, s.pack.id);
}

#[tokio::test]
async fn duplicate_override_pair_fails_second_time() {
    let s = seeded().await;
    let first = MemoryOverride::new(&s.tenant.id, &s.item.id, "Shipping takes 2 days");
    create_override(s.db.pool(), &first).await.unwrap();

    let second = MemoryOverride::new(&s.tenant.id, &s.item.id, "Shipping is free");
    let err = create_override(s.db.pool(), &second).await.unwrap_err();
    assert_eq!(unique_fields(err).0, "memory_overrides");
}

#[tokio::test]
async fn duplicate_install_fails() {
    let s = seeded().await;
    install_pack(s.db.pool(), &s.tenant.id, &s.pack.id)
        .await
        .unwrap();
    let err = install_pack(s.db.pool(), &s.tenant.id, &s.pack.id)
        .await
        .unwrap_err();
    assert_eq!(unique_fields(err).0, "memory_installs");
}

#[tokio::test]
async fn duplicate_brand_slug_email_and_scope_key_fail() {
    let s = seeded().await;

    let err = create_tenant(s.db.pool(), &MemoryTenant::new("Other", "bobs-bikes"))
        .await
        .unwrap_err();
    assert_eq!(unique_fields(err).1, vec!["brand_slug".to_string()]);

    create_user(s.db.pool(), &User::new("ada@example.com"))
        .await
        .unwrap();
    let err = create_user(s.db.pool(), &User::new("ada@example.com"))
        .await
        .unwrap_err();
    assert_eq!(unique_fields(err).1, vec!["email".to_string()]);

    create_caia_memory(s.db.pool(), &CaiaMemory::new("global", "k", json!(1)))
        .await
        .unwrap();
    let err = create_caia_memory(s.db.pool(), &CaiaMemory::new("global", "k", json!(2)))
        .await
        .unwrap_err();
    assert_eq!(unique_fields(err).0, "caia_memories");
}

#[tokio::test]
async fn references_must_exist() {
    let s = seeded().await;

    let orphan_item = MemoryPackItem::new("missing-pack", "faq", "x");
    assert!(create_pack_item(s.db.pool(), &orphan_item)
        .await
        .unwrap_err()
        .is_foreign_key_violation());

    let bad_tenant = MemoryOverride::new("missing-tenant", &s.item.id, "x");
    assert!(create_override(s.db.pool(), &bad_tenant)
        .await
        .unwrap_err()
        .is_foreign_key_violation());

    let bad_item = MemoryOverride::new(&s.tenant.id, "missing-item", "x");
    assert!(create_override(s.db.pool(), &bad_item)
        .await
        .unwrap_err()
        .is_foreign_key_violation());

    assert!(install_pack(s.db.pool(), "missing-tenant", &s.pack.id)
        .await
        .unwrap_err()
        .is_foreign_key_violation());
    assert!(install_pack(s.db.pool(), &s.tenant.id, "missing-pack")
        .await
        .unwrap_err()
        .is_foreign_key_violation());
}

#[tokio::test]
async fn learned_memory_kind_is_closed() {
    let db = CaiaDb::open_in_memory().await.unwrap();
    let err = sqlx::query(
        r#"
        INSERT INTO learned_memories (id, tenant_id, kind, content, importance, created_at)
        VALUES ('m1', 't1', 'opinion', 'Blue is best', 0, '2025-01-01T00:00:00Z')
        "#,
    )
    .execute(db.pool())
    .await
    .map_err(DbError::from)
    .unwrap_err();
    assert!(matches!(err, DbError::CheckViolation { .. }));

    for kind in ["fact", "preference", "task", "note", "identity"] {
        sqlx::query(
            r#"
            INSERT INTO learned_memories (id, tenant_id, kind, content, importance, created_at)
            VALUES (?, 't1', ?, 'ok', 0, '2025-01-01T00:00:00Z')
            "#,
        )
        .bind(format!("id-{kind}"))
        .bind(kind)
        .execute(db.pool())
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn resolve_only_covers_installed_packs() {
    let s = seeded().await;
    assert!(resolve_tenant_items(s.db.pool(), &s.tenant.id)
        .await
        .unwrap()
        .is_empty());

    install_pack(s.db.pool(), &s.tenant.id, &s.pack.id)
        .await
        .unwrap();
    let resolved = resolve_tenant_items(s.db.pool(), &s.tenant.id)
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].content, "Shipping takes 3 days");
    assert!(!resolved[0].overridden);

    create_override(
        s.db.pool(),
        &MemoryOverride::new(&s.tenant.id, &s.item.id, "Shipping takes 2 days"),
    )
    .await
    .unwrap();
    let resolved = resolve_tenant_items(s.db.pool(), &s.tenant.id)
        .await
        .unwrap();
    assert_eq!(resolved[0].content, "Shipping takes 2 days");
    assert!(resolved[0].overridden);
}
