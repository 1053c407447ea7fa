//! User commands

use caia_db::{CaiaDb, Page, User, queries};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// Create a user, or update the one with the same email
pub async fn add(
    db: &CaiaDb,
    email: &str,
    display_name: Option<&str>,
    role: Option<&str>,
    output: &Output,
) -> Result<()> {
    let mut user = User::new(email);
    if let Some(name) = display_name {
        user = user.with_display_name(name);
    }
    if let Some(role) = role {
        user = user.with_role(role);
    }

    let stored = queries::upsert_user_by_email(db.pool(), &user).await?;
    if stored.id == user.id {
        output.success(&format!("Created user {}", stored.email.bright_cyan()));
    } else {
        output.success(&format!("Updated user {}", stored.email.bright_cyan()));
    }
    output.kv("ID", &stored.id);
    output.kv("Role", &stored.role);
    Ok(())
}

pub async fn list(db: &CaiaDb, limit: Option<i64>, output: &Output) -> Result<()> {
    let page = Page {
        skip: None,
        take: limit,
    };
    let users = queries::list_users(db.pool(), page).await?;
    let total = queries::count_users(db.pool()).await?;

    if users.is_empty() {
        output.info("No users found", "Create one with: caia user add <email>");
        return Ok(());
    }

    output.status(&format!("Showing {} of {total} user(s):", users.len()));
    output.status("");
    for user in users {
        output.info("•", &user.email.bright_cyan().to_string());
        output.kv("  ID", &user.id);
        if let Some(name) = &user.display_name {
            output.kv("  Name", name);
        }
        output.kv("  Role", &user.role);
    }
    Ok(())
}
