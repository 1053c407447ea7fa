//! Error types for the database layer.

use miette::Diagnostic;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error types.
///
/// Constraint failures reported by SQLite are classified when a
/// `sqlx::Error` is converted, so callers can match on
/// [`DbError::UniqueViolation`] and friends instead of inspecting
/// driver messages.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(caia_db::migration))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database could not be opened or configured
    #[error("Initialization error: {message}")]
    #[diagnostic(code(caia_db::initialization))]
    Initialization { message: String },

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    #[diagnostic(code(caia_db::not_found))]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Unique constraint failed
    #[error("Unique constraint failed on {table} ({})", .fields.join(", "))]
    #[diagnostic(
        code(caia_db::unique_violation),
        help("A row with the same values already exists")
    )]
    UniqueViolation { table: String, fields: Vec<String> },

    /// Referenced row does not exist (or is still referenced)
    #[error("Foreign key constraint failed: {message}")]
    #[diagnostic(code(caia_db::foreign_key_violation))]
    ForeignKeyViolation { message: String },

    /// CHECK constraint failed
    #[error("Check constraint failed: {message}")]
    #[diagnostic(code(caia_db::check_violation))]
    CheckViolation { message: String },

    /// Pack signature does not match its content
    #[error("Signature mismatch: expected {expected}, computed {actual}")]
    #[diagnostic(
        code(caia_db::signature_mismatch),
        help("The pack content was modified after signing, or the signature is for another pack")
    )]
    SignatureMismatch { expected: String, actual: String },

    /// Invalid data
    #[error("Invalid data: {message}")]
    #[diagnostic(code(caia_db::invalid_data))]
    InvalidData { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an initialization error.
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Whether this error is a unique constraint failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Whether this error is a foreign key failure.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::ForeignKeyViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => db_err.kind(),
            _ => return Self::Sqlx(err),
        };

        let message = match &err {
            sqlx::Error::Database(db_err) => db_err.message().to_string(),
            _ => String::new(),
        };

        match kind {
            ErrorKind::UniqueViolation => {
                let (table, fields) = parse_unique_target(&message);
                Self::UniqueViolation { table, fields }
            }
            ErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation { message },
            ErrorKind::CheckViolation => Self::CheckViolation { message },
            _ => Self::Sqlx(err),
        }
    }
}

/// Extract table and column names from a SQLite unique failure message.
///
/// SQLite reports `UNIQUE constraint failed: t.a, t.b`.
fn parse_unique_target(message: &str) -> (String, Vec<String>) {
    let Some((_, target)) = message.split_once(':') else {
        return (String::from("unknown"), Vec::new());
    };

    let mut table = String::from("unknown");
    let fields = target
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|qualified| match qualified.split_once('.') {
            Some((t, column)) => {
                table = t.to_string();
                column.to_string()
            }
            None => qualified.to_string(),
        })
        .collect();

    (table, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unique_target() {
        let (table, fields) = parse_unique_target(
            "UNIQUE constraint failed: memory_packs.vendor_id, memory_packs.slug, memory_packs.version",
        );
        assert_eq!(table, "memory_packs");
        assert_eq!(fields, vec!["vendor_id", "slug", "version"]);

        let (table, fields) = parse_unique_target("UNIQUE constraint failed: users.email");
        assert_eq!(table, "users");
        assert_eq!(fields, vec!["email"]);

        let (table, fields) = parse_unique_target("something else");
        assert_eq!(table, "unknown");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_unique_violation_display() {
        let err = DbError::UniqueViolation {
            table: "memory_installs".into(),
            fields: vec!["tenant_id".into(), "pack_id".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unique constraint failed on memory_installs (tenant_id, pack_id)"
        );
        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }
}
