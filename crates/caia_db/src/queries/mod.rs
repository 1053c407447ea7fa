//! Database query functions.
//!
//! Organized by domain:
//! - `user`: User accounts
//! - `message`: CIMS message log
//! - `task`: Workfocus task buckets
//! - `pack`: Vendors, memory packs and pack items
//! - `tenant`: Tenants, installs, overrides and item resolution
//! - `learned`: Learned memories with ranking and retention
//! - `kv`: Scoped key/value memories
//! - `stats`: Row counts

mod kv;
mod learned;
mod message;
mod pack;
mod stats;
mod task;
mod tenant;
mod user;

pub use kv::*;
pub use learned::*;
pub use message::*;
pub use pack::*;
pub use stats::*;
pub use task::*;
pub use tenant::*;
pub use user::*;
