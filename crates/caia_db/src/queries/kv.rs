//! Scoped key/value memory queries.

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::error::DbResult;
use crate::models::{CaiaMemory, new_id};
use crate::validate;

/// Create an entry. Fails with a unique violation if (scope, key) exists.
pub async fn create_caia_memory(pool: &SqlitePool, entry: &CaiaMemory) -> DbResult<()> {
    validate::non_empty("scope", &entry.scope)?;
    validate::non_empty("key", &entry.key)?;

    sqlx::query(
        r#"
        INSERT INTO caia_memories (id, scope, key, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.scope)
    .bind(&entry.key)
    .bind(&entry.value)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get the entry stored under (scope, key).
pub async fn get_caia_memory(
    pool: &SqlitePool,
    scope: &str,
    key: &str,
) -> DbResult<Option<CaiaMemory>> {
    let entry = sqlx::query_as::<_, CaiaMemory>(
        r#"
        SELECT id, scope, key, value, created_at, updated_at
        FROM caia_memories WHERE scope = ? AND key = ?
        "#,
    )
    .bind(scope)
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// Store `value` under (scope, key), replacing any previous value.
///
/// An existing entry keeps its id and `created_at`.
pub async fn set_caia_memory(
    pool: &SqlitePool,
    scope: &str,
    key: &str,
    value: &serde_json::Value,
) -> DbResult<CaiaMemory> {
    validate::non_empty("scope", scope)?;
    validate::non_empty("key", key)?;

    let now = Utc::now();
    let entry = sqlx::query_as::<_, CaiaMemory>(
        r#"
        INSERT INTO caia_memories (id, scope, key, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(scope, key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        RETURNING id, scope, key, value, created_at, updated_at
        "#,
    )
    .bind(new_id())
    .bind(scope)
    .bind(key)
    .bind(Json(value))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

/// List a scope's entries by key.
pub async fn list_caia_scope(pool: &SqlitePool, scope: &str) -> DbResult<Vec<CaiaMemory>> {
    let entries = sqlx::query_as::<_, CaiaMemory>(
        r#"
        SELECT id, scope, key, value, created_at, updated_at
        FROM caia_memories WHERE scope = ? ORDER BY key
        "#,
    )
    .bind(scope)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Delete the entry under (scope, key).
pub async fn delete_caia_memory(pool: &SqlitePool, scope: &str, key: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM caia_memories WHERE scope = ? AND key = ?")
        .bind(scope)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every entry in a scope. Returns rows deleted.
pub async fn delete_caia_scope(pool: &SqlitePool, scope: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM caia_memories WHERE scope = ?")
        .bind(scope)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaiaDb;
    use crate::error::DbError;
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_scope_key_rejected() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        create_caia_memory(db.pool(), &CaiaMemory::new("tenant:bob", "greeting", json!("hi")))
            .await
            .unwrap();

        let err = create_caia_memory(
            db.pool(),
            &CaiaMemory::new("tenant:bob", "greeting", json!("hello")),
        )
        .await
        .unwrap_err();
        match err {
            DbError::UniqueViolation { table, fields } => {
                assert_eq!(table, "caia_memories");
                assert_eq!(fields, vec!["scope", "key"]);
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        // Same key in another scope is fine
        create_caia_memory(db.pool(), &CaiaMemory::new("tenant:carla", "greeting", json!("hey")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let first = set_caia_memory(db.pool(), "global", "limits", &json!({ "max": 1 }))
            .await
            .unwrap();
        let second = set_caia_memory(db.pool(), "global", "limits", &json!({ "max": 2 }))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);

        let fetched = get_caia_memory(db.pool(), "global", "limits")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.value.0, json!({ "max": 2 }));
    }

    #[tokio::test]
    async fn test_scope_listing_and_deletes() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        for key in ["b", "a", "c"] {
            set_caia_memory(db.pool(), "s", key, &json!(key)).await.unwrap();
        }
        set_caia_memory(db.pool(), "other", "a", &json!(1)).await.unwrap();

        let keys: Vec<_> = list_caia_scope(db.pool(), "s")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        assert!(delete_caia_memory(db.pool(), "s", "a").await.unwrap());
        assert!(!delete_caia_memory(db.pool(), "s", "a").await.unwrap());
        assert_eq!(delete_caia_scope(db.pool(), "s").await.unwrap(), 2);
        assert!(get_caia_memory(db.pool(), "other", "a").await.unwrap().is_some());
    }
}
