//! Learned memory queries.
//!
//! Memories are ranked by importance, then recency of use, then recency of
//! creation. The same ranking drives listing and [`trim_tenant_memories`].

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::filter::{Conditions, Page};
use crate::models::{LearnedMemory, LearnedMemoryKind};
use crate::validate;

const RANK_ORDER: &str =
    "importance DESC, last_used_at IS NULL, last_used_at DESC, created_at DESC, id ASC";

/// Filter for [`list_learned_memories`].
#[derive(Debug, Clone, Default)]
pub struct LearnedMemoryFilter {
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub kind: Option<LearnedMemoryKind>,
    pub min_importance: Option<i64>,
    pub subject: Option<String>,
    /// Case-insensitive substring match on content
    pub contains: Option<String>,
    /// Include rows whose `expire_at` has passed
    pub include_expired: bool,
    pub page: Page,
}

impl LearnedMemoryFilter {
    /// Active memories of one tenant.
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Default::default()
        }
    }
}

/// Create a learned memory.
pub async fn create_learned_memory(pool: &SqlitePool, memory: &LearnedMemory) -> DbResult<()> {
    validate::non_empty("tenant_id", &memory.tenant_id)?;
    validate::non_empty("memory content", &memory.content)?;
    if let Some(expire_at) = &memory.expire_at {
        validate::timestamp("expire_at", expire_at)?;
    }

    sqlx::query(
        r#"
        INSERT INTO learned_memories
            (id, tenant_id, user_id, kind, subject, content, tags, importance, source, created_at, last_used_at, expire_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&memory.id)
    .bind(&memory.tenant_id)
    .bind(&memory.user_id)
    .bind(memory.kind)
    .bind(&memory.subject)
    .bind(&memory.content)
    .bind(&memory.tags)
    .bind(memory.importance)
    .bind(&memory.source)
    .bind(memory.created_at)
    .bind(memory.last_used_at)
    .bind(memory.expire_at)
    .execute(pool)
    .await?;
    debug!(memory_id = %memory.id, tenant_id = %memory.tenant_id, kind = %memory.kind, "learned memory");
    Ok(())
}

/// Get a learned memory by ID, expired or not.
pub async fn get_learned_memory(pool: &SqlitePool, id: &str) -> DbResult<Option<LearnedMemory>> {
    let memory = sqlx::query_as::<_, LearnedMemory>(
        r#"
        SELECT id, tenant_id, user_id, kind, subject, content, tags, importance, source,
               created_at, last_used_at, expire_at
        FROM learned_memories WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(memory)
}

/// List learned memories in rank order.
pub async fn list_learned_memories(
    pool: &SqlitePool,
    filter: &LearnedMemoryFilter,
) -> DbResult<Vec<LearnedMemory>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"SELECT id, tenant_id, user_id, kind, subject, content, tags, importance, source,
               created_at, last_used_at, expire_at
        FROM learned_memories"#,
    );
    let mut conditions = Conditions::new();

    if let Some(tenant_id) = &filter.tenant_id {
        conditions.next(&mut qb).push("tenant_id = ").push_bind(tenant_id.clone());
    }
    if let Some(user_id) = &filter.user_id {
        conditions.next(&mut qb).push("user_id = ").push_bind(user_id.clone());
    }
    if let Some(kind) = filter.kind {
        conditions.next(&mut qb).push("kind = ").push_bind(kind);
    }
    if let Some(min) = filter.min_importance {
        conditions.next(&mut qb).push("importance >= ").push_bind(min);
    }
    if let Some(subject) = &filter.subject {
        conditions.next(&mut qb).push("subject = ").push_bind(subject.clone());
    }
    if let Some(needle) = &filter.contains {
        conditions
            .next(&mut qb)
            .push("content LIKE ")
            .push_bind(format!("%{}%", escape_like(needle)))
            .push(" ESCAPE '\\'");
    }
    if !filter.include_expired {
        conditions
            .next(&mut qb)
            .push("(expire_at IS NULL OR expire_at > ")
            .push_bind(Utc::now())
            .push(")");
    }

    qb.push(" ORDER BY ").push(RANK_ORDER);
    filter.page.push_to(&mut qb);

    let memories = qb.build_query_as::<LearnedMemory>().fetch_all(pool).await?;
    Ok(memories)
}

/// Mark a memory as recalled now.
pub async fn touch_learned_memory(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE learned_memories SET last_used_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Change a memory's importance.
pub async fn set_learned_memory_importance(
    pool: &SqlitePool,
    id: &str,
    importance: i64,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE learned_memories SET importance = ? WHERE id = ?")
        .bind(importance)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a learned memory.
pub async fn delete_learned_memory(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM learned_memories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete memories that expired at or before `now`. Returns rows deleted.
pub async fn prune_expired_memories(pool: &SqlitePool, now: DateTime<Utc>) -> DbResult<u64> {
    let result =
        sqlx::query("DELETE FROM learned_memories WHERE expire_at IS NOT NULL AND expire_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

    let pruned = result.rows_affected();
    if pruned > 0 {
        warn!(pruned, "pruned expired learned memories");
    }
    Ok(pruned)
}

/// Keep a tenant's `keep` highest-ranked memories and delete the rest.
/// Returns rows deleted.
pub async fn trim_tenant_memories(pool: &SqlitePool, tenant_id: &str, keep: i64) -> DbResult<u64> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM learned_memories
        WHERE tenant_id = ?
          AND id NOT IN (
            SELECT id FROM learned_memories
            WHERE tenant_id = ?
            ORDER BY {RANK_ORDER}
            LIMIT ?
          )
        "#
    ))
    .bind(tenant_id)
    .bind(tenant_id)
    .bind(keep.max(0))
    .execute(pool)
    .await?;

    let trimmed = result.rows_affected();
    if trimmed > 0 {
        warn!(tenant_id, trimmed, keep, "trimmed learned memories");
    }
    Ok(trimmed)
}

/// Count a tenant's memories, expired ones included.
pub async fn count_tenant_memories(pool: &SqlitePool, tenant_id: &str) -> DbResult<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM learned_memories WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
