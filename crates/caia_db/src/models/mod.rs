//! Database models.
//!
//! These structs map directly to database tables via sqlx.

mod kv;
mod learned;
mod message;
mod pack;
mod task;
mod tenant;
mod user;

pub use kv::CaiaMemory;
pub use learned::{LearnedMemory, LearnedMemoryKind};
pub use message::{CimsMessage, MessageDirection};
pub use pack::{MemoryPack, MemoryPackItem, MemoryVendor};
pub use task::{TaskStatus, WorkfocusTask};
pub use tenant::{MemoryInstall, MemoryOverride, MemoryTenant, ResolvedItem};
pub use user::User;

/// Generate a fresh row identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
