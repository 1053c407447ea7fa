//! Message queries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::DbResult;
use crate::filter::{Conditions, Page, SortOrder};
use crate::models::{CimsMessage, MessageDirection};
use crate::validate;

/// Filter for [`list_messages`].
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub thread_id: Option<String>,
    pub channel: Option<String>,
    pub direction: Option<MessageDirection>,
    pub sender_id: Option<String>,
    /// Only messages created at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Order by creation time
    pub order: SortOrder,
    pub page: Page,
}

/// Create a new message.
pub async fn create_message(pool: &SqlitePool, msg: &CimsMessage) -> DbResult<()> {
    validate::non_empty("thread_id", &msg.thread_id)?;
    validate::non_empty("channel", &msg.channel)?;

    sqlx::query(
        r#"
        INSERT INTO cims_messages (id, thread_id, channel, direction, body, media_url, metadata, sender_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&msg.id)
    .bind(&msg.thread_id)
    .bind(&msg.channel)
    .bind(msg.direction)
    .bind(&msg.body)
    .bind(&msg.media_url)
    .bind(&msg.metadata)
    .bind(&msg.sender_id)
    .bind(msg.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: &str) -> DbResult<Option<CimsMessage>> {
    let msg = sqlx::query_as::<_, CimsMessage>(
        r#"
        SELECT id, thread_id, channel, direction, body, media_url, metadata, sender_id, created_at
        FROM cims_messages WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(msg)
}

/// List messages matching a filter.
pub async fn list_messages(pool: &SqlitePool, filter: &MessageFilter) -> DbResult<Vec<CimsMessage>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, thread_id, channel, direction, body, media_url, metadata, sender_id, created_at FROM cims_messages",
    );
    let mut conditions = Conditions::new();

    if let Some(thread_id) = &filter.thread_id {
        conditions.next(&mut qb).push("thread_id = ").push_bind(thread_id.clone());
    }
    if let Some(channel) = &filter.channel {
        conditions.next(&mut qb).push("channel = ").push_bind(channel.clone());
    }
    if let Some(direction) = filter.direction {
        conditions.next(&mut qb).push("direction = ").push_bind(direction);
    }
    if let Some(sender_id) = &filter.sender_id {
        conditions.next(&mut qb).push("sender_id = ").push_bind(sender_id.clone());
    }
    if let Some(since) = filter.since {
        conditions.next(&mut qb).push("created_at >= ").push_bind(since);
    }

    qb.push(" ORDER BY created_at ")
        .push(filter.order.as_sql())
        .push(", id ")
        .push(filter.order.as_sql());
    filter.page.push_to(&mut qb);

    let messages = qb.build_query_as::<CimsMessage>().fetch_all(pool).await?;
    Ok(messages)
}

/// All messages in a thread, oldest first.
pub async fn list_thread(pool: &SqlitePool, thread_id: &str) -> DbResult<Vec<CimsMessage>> {
    list_messages(
        pool,
        &MessageFilter {
            thread_id: Some(thread_id.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// Count messages in a thread.
pub async fn count_thread(pool: &SqlitePool, thread_id: &str) -> DbResult<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cims_messages WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Delete a message.
pub async fn delete_message(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM cims_messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
