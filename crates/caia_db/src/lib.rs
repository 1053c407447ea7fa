//! CAIA Database Layer
//!
//! SQLite-based storage for the CAIA assistant platform.
//!
//! # Architecture
//!
//! - **Users, messages, tasks** - Accounts, the CIMS message log and workfocus buckets
//! - **Memory packs** - Vendors publish versioned packs of items that tenants install
//! - **Overrides** - Tenants replace item content without touching the pack
//! - **Learned memories** - Ranked, expiring memories per tenant
//! - **CAIA memories** - A scoped key/value store
//!
//! Uniqueness and referential rules live in the schema. Violations surface
//! as typed [`DbError`] variants.
//!
//! # Usage
//!
//! ```rust,ignore
//! use caia_db::CaiaDb;
//!
//! let db = CaiaDb::open("path/to/caia.db").await?;
//! let stats = db.stats().await?;
//! ```

pub mod config;
pub mod connection;
pub mod digest;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod models;
pub mod queries;
pub mod validate;

pub use config::DbConfig;
pub use connection::CaiaDb;
pub use error::{DbError, DbResult};
pub use filter::{Page, SortOrder};

pub use digest::{DigestItem, PackVerification, pack_digest, sign_pack, verify_pack};
pub use manifest::{
    ImportedPack, ItemManifest, PackHeader, PackManifest, VendorManifest, export_pack,
    import_manifest,
};

// Re-export key model types for convenience
pub use models::{
    CaiaMemory, CimsMessage, LearnedMemory, LearnedMemoryKind, MemoryInstall, MemoryOverride,
    MemoryPack, MemoryPackItem, MemoryTenant, MemoryVendor, MessageDirection, ResolvedItem,
    TaskStatus, User, WorkfocusTask,
};
pub use queries::DbStats;

// Re-export Json wrapper for JSON columns
pub use sqlx::types::Json;
