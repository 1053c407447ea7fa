//! Database statistics queries.

use sqlx::{FromRow, SqlitePool};

use crate::error::DbResult;

/// Row counts for every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct DbStats {
    pub user_count: i64,
    pub message_count: i64,
    pub task_count: i64,
    pub vendor_count: i64,
    pub pack_count: i64,
    pub pack_item_count: i64,
    pub tenant_count: i64,
    pub install_count: i64,
    pub override_count: i64,
    pub learned_memory_count: i64,
    pub caia_memory_count: i64,
}

/// Get overall database statistics.
pub async fn get_stats(pool: &SqlitePool) -> DbResult<DbStats> {
    let stats = sqlx::query_as::<_, DbStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS user_count,
            (SELECT COUNT(*) FROM cims_messages) AS message_count,
            (SELECT COUNT(*) FROM workfocus_tasks) AS task_count,
            (SELECT COUNT(*) FROM memory_vendors) AS vendor_count,
            (SELECT COUNT(*) FROM memory_packs) AS pack_count,
            (SELECT COUNT(*) FROM memory_pack_items) AS pack_item_count,
            (SELECT COUNT(*) FROM memory_tenants) AS tenant_count,
            (SELECT COUNT(*) FROM memory_installs) AS install_count,
            (SELECT COUNT(*) FROM memory_overrides) AS override_count,
            (SELECT COUNT(*) FROM learned_memories) AS learned_memory_count,
            (SELECT COUNT(*) FROM caia_memories) AS caia_memory_count
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Tenants ranked by learned memory count, most first.
pub async fn get_busiest_tenants(pool: &SqlitePool, limit: i64) -> DbResult<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT tenant_id, COUNT(*) AS memory_count
        FROM learned_memories
        GROUP BY tenant_id
        ORDER BY memory_count DESC, tenant_id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaiaDb;
    use crate::models::{LearnedMemory, LearnedMemoryKind, User};
    use crate::queries::{create_learned_memory, create_user};

    #[tokio::test]
    async fn test_empty_stats() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let stats = get_stats(db.pool()).await.unwrap();
        assert_eq!(stats, DbStats::default());
    }

    #[tokio::test]
    async fn test_busiest_tenants() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        create_user(db.pool(), &User::new("a@example.com")).await.unwrap();
        for (tenant, n) in [("acme", 3), ("zeta", 1), ("beta", 3)] {
            for i in 0..n {
                let memory =
                    LearnedMemory::new(tenant, LearnedMemoryKind::Note, format!("note {i}"));
                create_learned_memory(db.pool(), &memory).await.unwrap();
            }
        }

        let stats = get_stats(db.pool()).await.unwrap();
        assert_eq!(stats.user_count, 1);
        assert_eq!(stats.learned_memory_count, 7);

        let busiest = get_busiest_tenants(db.pool(), 2).await.unwrap();
        assert_eq!(
            busiest,
            vec![("acme".to_string(), 3), ("beta".to_string(), 3)]
        );
    }
}
