//! Learned memory commands

use caia_db::queries::{self, LearnedMemoryFilter};
use caia_db::{CaiaDb, LearnedMemory, LearnedMemoryKind, Page};
use chrono::{DateTime, TimeDelta, Utc};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// Fields for a new learned memory
#[derive(Debug, Clone)]
pub struct NewMemory<'a> {
    pub tenant: &'a str,
    pub content: &'a str,
    pub kind: LearnedMemoryKind,
    pub importance: i64,
    pub subject: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub expires_in_days: Option<i64>,
}

/// Record a learned memory
pub async fn add(db: &CaiaDb, new: NewMemory<'_>, output: &Output) -> Result<()> {
    let mut memory =
        LearnedMemory::new(new.tenant, new.kind, new.content).with_importance(new.importance);
    if let Some(subject) = new.subject {
        memory = memory.with_subject(subject);
    }
    if let Some(user_id) = new.user_id {
        memory = memory.with_user(user_id);
    }
    if let Some(days) = new.expires_in_days {
        memory = memory.expiring_at(expiry_after(Utc::now(), days)?);
    }
    memory.source = Some("cli".to_string());

    queries::create_learned_memory(db.pool(), &memory).await?;
    output.success(&format!("Stored {} memory", memory.kind.yellow()));
    output.kv("ID", &memory.id);
    Ok(())
}

/// List a tenant's memories in rank order
pub async fn list(
    db: &CaiaDb,
    filter: LearnedMemoryFilter,
    output: &Output,
) -> Result<()> {
    let memories = queries::list_learned_memories(db.pool(), &filter).await?;
    if memories.is_empty() {
        output.status("No memories found");
        return Ok(());
    }

    let now = Utc::now();
    for memory in memories {
        let mut header = format!("[{}] importance {}", memory.kind.yellow(), memory.importance);
        if memory.is_expired(now) {
            header.push_str(&format!(" {}", "expired".red()));
        }
        output.info("•", &header);
        output.kv("  ID", &memory.id);
        if let Some(subject) = &memory.subject {
            output.kv("  Subject", subject);
        }
        output.kv("  Content", &memory.content);
        if let Some(used) = memory.last_used_at {
            output.kv("  Last used", &used.to_rfc3339());
        }
        if let Some(expire_at) = memory.expire_at {
            output.kv("  Expires", &expire_at.to_rfc3339());
        }
    }
    Ok(())
}

/// Expiry `days` from `now`, rejecting offsets chrono cannot represent.
fn expiry_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| {
            miette::miette!(
                help = "Use a smaller --expires-in-days value",
                "Expiry of {} days is out of range",
                days
            )
        })
}

/// Build a list filter from command line options.
pub fn filter(
    tenant: &str,
    kind: Option<LearnedMemoryKind>,
    min_importance: Option<i64>,
    contains: Option<String>,
    include_expired: bool,
    limit: Option<i64>,
) -> LearnedMemoryFilter {
    LearnedMemoryFilter {
        kind,
        min_importance,
        contains,
        include_expired,
        page: Page {
            skip: None,
            take: limit,
        },
        ..LearnedMemoryFilter::for_tenant(tenant)
    }
}

/// Mark a memory as just used
pub async fn touch(db: &CaiaDb, id: &str, output: &Output) -> Result<()> {
    if queries::touch_learned_memory(db.pool(), id).await? {
        output.success(&format!("Touched {id}"));
        Ok(())
    } else {
        Err(miette::miette!("Learned memory not found: {}", id))
    }
}

/// Delete memories whose expiry has passed
pub async fn prune(db: &CaiaDb, output: &Output) -> Result<()> {
    let removed = queries::prune_expired_memories(db.pool(), Utc::now()).await?;
    output.success(&format!("Pruned {removed} expired memories"));
    Ok(())
}

/// Keep only a tenant's top `keep` memories
pub async fn trim(db: &CaiaDb, tenant: &str, keep: i64, output: &Output) -> Result<()> {
    let removed = queries::trim_tenant_memories(db.pool(), tenant, keep).await?;
    let remaining = queries::count_tenant_memories(db.pool(), tenant).await?;
    output.success(&format!(
        "Removed {removed} memories from {}, {remaining} left",
        tenant.bright_cyan()
    ));
    Ok(())
}
