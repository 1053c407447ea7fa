//! User queries.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::filter::Page;
use crate::models::User;
use crate::validate;

/// Create a new user.
///
/// Fails with [`DbError::UniqueViolation`] if the email is taken.
pub async fn create_user(pool: &SqlitePool, user: &User) -> DbResult<()> {
    validate::email(&user.email)?;
    validate::non_empty("role", &user.role)?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, display_name, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.role)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    debug!(user_id = %user.id, "created user");
    Ok(())
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, display_name, role, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, display_name, role, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// List users ordered by creation time.
pub async fn list_users(pool: &SqlitePool, page: Page) -> DbResult<Vec<User>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, email, display_name, role, created_at FROM users ORDER BY created_at ASC, id ASC",
    );
    page.push_to(&mut qb);
    let users = qb.build_query_as::<User>().fetch_all(pool).await?;
    Ok(users)
}

/// Update a user's display name and role.
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    display_name: Option<&str>,
    role: &str,
) -> DbResult<bool> {
    validate::non_empty("role", role)?;
    let result = sqlx::query("UPDATE users SET display_name = ?, role = ? WHERE id = ?")
        .bind(display_name)
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert the user, or update display name and role of the user with the
/// same email. Returns the stored row.
pub async fn upsert_user_by_email(pool: &SqlitePool, user: &User) -> DbResult<User> {
    validate::email(&user.email)?;
    validate::non_empty("role", &user.role)?;

    let stored = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, display_name, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            display_name = excluded.display_name,
            role = excluded.role
        RETURNING id, email, display_name, role, created_at
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.role)
    .bind(user.created_at)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Delete a user. Messages, tasks and learned memories keep their rows
/// with the user reference cleared.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count users.
pub async fn count_users(pool: &SqlitePool) -> DbResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Get a user by ID, failing if missing.
pub async fn require_user(pool: &SqlitePool, id: &str) -> DbResult<User> {
    get_user(pool, id)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
}
