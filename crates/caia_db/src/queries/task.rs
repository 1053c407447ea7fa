//! Workfocus task queries.

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::filter::{Conditions, Page};
use crate::models::{TaskStatus, WorkfocusTask};
use crate::validate;

/// Filter for [`list_tasks`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub owner_id: Option<String>,
    pub bucket: Option<String>,
    pub status: Option<String>,
    /// Only tasks due at or before this instant
    pub due_before: Option<DateTime<Utc>>,
    /// Skip tasks that are done or cancelled
    pub open_only: bool,
    pub page: Page,
}

/// Create a new task.
pub async fn create_task(pool: &SqlitePool, task: &WorkfocusTask) -> DbResult<()> {
    validate::non_empty("title", &task.title)?;
    validate::non_empty("bucket", &task.bucket)?;
    validate::non_empty("status", &task.status)?;
    if let Some(due_at) = &task.due_at {
        validate::timestamp("due_at", due_at)?;
    }

    sqlx::query(
        r#"
        INSERT INTO workfocus_tasks (id, owner_id, bucket, title, status, due_at, metadata, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.owner_id)
    .bind(&task.bucket)
    .bind(&task.title)
    .bind(&task.status)
    .bind(task.due_at)
    .bind(&task.metadata)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get a task by ID.
pub async fn get_task(pool: &SqlitePool, id: &str) -> DbResult<Option<WorkfocusTask>> {
    let task = sqlx::query_as::<_, WorkfocusTask>(
        r#"
        SELECT id, owner_id, bucket, title, status, due_at, metadata, created_at, updated_at
        FROM workfocus_tasks WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

/// List tasks matching a filter, soonest due first (undated last).
pub async fn list_tasks(pool: &SqlitePool, filter: &TaskFilter) -> DbResult<Vec<WorkfocusTask>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, owner_id, bucket, title, status, due_at, metadata, created_at, updated_at FROM workfocus_tasks",
    );
    let mut conditions = Conditions::new();

    if let Some(owner_id) = &filter.owner_id {
        conditions.next(&mut qb).push("owner_id = ").push_bind(owner_id.clone());
    }
    if let Some(bucket) = &filter.bucket {
        conditions.next(&mut qb).push("bucket = ").push_bind(bucket.clone());
    }
    if let Some(status) = &filter.status {
        conditions.next(&mut qb).push("status = ").push_bind(status.clone());
    }
    if let Some(due_before) = filter.due_before {
        conditions
            .next(&mut qb)
            .push("due_at IS NOT NULL AND due_at <= ")
            .push_bind(due_before);
    }
    if filter.open_only {
        conditions
            .next(&mut qb)
            .push("status NOT IN (")
            .push_bind(TaskStatus::Done.as_str())
            .push(", ")
            .push_bind(TaskStatus::Cancelled.as_str())
            .push(")");
    }

    qb.push(" ORDER BY due_at IS NULL, due_at ASC, created_at ASC");
    filter.page.push_to(&mut qb);

    let tasks = qb.build_query_as::<WorkfocusTask>().fetch_all(pool).await?;
    Ok(tasks)
}

/// Open tasks due within the next `hours` hours (including overdue ones).
pub async fn get_tasks_due_within(pool: &SqlitePool, hours: i64) -> DbResult<Vec<WorkfocusTask>> {
    let deadline = TimeDelta::try_hours(hours)
        .and_then(|window| Utc::now().checked_add_signed(window))
        .ok_or_else(|| {
            DbError::invalid_data(format!("due window of {hours} hours is out of range"))
        })?;
    validate::timestamp("due window", &deadline)?;
    list_tasks(
        pool,
        &TaskFilter {
            due_before: Some(deadline),
            open_only: true,
            ..Default::default()
        },
    )
    .await
}

/// Update task status.
pub async fn update_task_status(pool: &SqlitePool, id: &str, status: &str) -> DbResult<bool> {
    validate::non_empty("status", status)?;
    let result = sqlx::query("UPDATE workfocus_tasks SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Update a task's editable fields. `updated_at` is set to now.
pub async fn update_task(pool: &SqlitePool, task: &WorkfocusTask) -> DbResult<bool> {
    validate::non_empty("title", &task.title)?;
    validate::non_empty("bucket", &task.bucket)?;
    validate::non_empty("status", &task.status)?;
    if let Some(due_at) = &task.due_at {
        validate::timestamp("due_at", due_at)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE workfocus_tasks
        SET owner_id = ?, bucket = ?, title = ?, status = ?, due_at = ?, metadata = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&task.owner_id)
    .bind(&task.bucket)
    .bind(&task.title)
    .bind(&task.status)
    .bind(task.due_at)
    .bind(&task.metadata)
    .bind(Utc::now())
    .bind(&task.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a task.
pub async fn delete_task(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM workfocus_tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaiaDb;
    use crate::models::User;
    use crate::queries::create_user;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_update_task() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let task = WorkfocusTask::new("inbox", "Call the supplier");
        create_task(db.pool(), &task).await.unwrap();

        let fetched = get_task(db.pool(), &task.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, "open");
        assert_eq!(fetched.owner_id, None);

        assert!(update_task_status(db.pool(), &task.id, "done").await.unwrap());
        let fetched = get_task(db.pool(), &task.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, "done");
        assert!(fetched.updated_at >= fetched.created_at);

        let mut edited = fetched.clone();
        edited.title = "Call the new supplier".to_string();
        edited.bucket = "today".to_string();
        assert!(update_task(db.pool(), &edited).await.unwrap());
        let fetched = get_task(db.pool(), &task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Call the new supplier");
        assert_eq!(fetched.bucket, "today");

        assert!(delete_task(db.pool(), &task.id).await.unwrap());
        assert!(get_task(db.pool(), &task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters_and_due_within() {
        let db = CaiaDb::open_in_memory().await.unwrap();
        let owner = User::new("owner@example.com");
        create_user(db.pool(), &owner).await.unwrap();

        let mut soon = WorkfocusTask::new("today", "soon");
        soon.owner_id = Some(owner.id.clone());
        soon.due_at = Some(Utc::now() + Duration::hours(2));

        let mut later = WorkfocusTask::new("today", "later");
        later.due_at = Some(Utc::now() + Duration::days(3));

        let mut finished = WorkfocusTask::new("today", "finished");
        finished.due_at = Some(Utc::now() + Duration::hours(1));
        finished.status = TaskStatus::Done.as_str().to_string();

        let undated = WorkfocusTask::new("someday", "undated");

        for task in [&soon, &later, &finished, &undated] {
            create_task(db.pool(), task).await.unwrap();
        }

        let due = get_tasks_due_within(db.pool(), 24).await.unwrap();
        let titles: Vec<_> = due.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["soon"]);

        let owned = list_tasks(
            db.pool(),
            &TaskFilter {
                owner_id: Some(owner.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(owned.len(), 1);

        let today = list_tasks(
            db.pool(),
            &TaskFilter {
                bucket: Some("today".to_string()),
                open_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let titles: Vec<_> = today.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "later"]);

        let all = list_tasks(db.pool(), &TaskFilter::default()).await.unwrap();
        assert_eq!(all.last().unwrap().title, "undated");
    }

    #[tokio::test]
    async fn test_due_within_rejects_out_of_range_window() {
        let db = CaiaDb::open_in_memory().await.unwrap();

        let err = get_tasks_due_within(db.pool(), i64::MAX / 4).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));

        let err = get_tasks_due_within(db.pool(), i64::MIN).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));

        // representable, but past year 9999
        let err = get_tasks_due_within(db.pool(), 24 * 365 * 9000).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));

        let mut task = WorkfocusTask::new("later", "far future");
        task.due_at = Some(Utc::now() + Duration::days(365 * 9000));
        assert!(matches!(
            create_task(db.pool(), &task).await.unwrap_err(),
            DbError::InvalidData { .. }
        ));
    }
}
