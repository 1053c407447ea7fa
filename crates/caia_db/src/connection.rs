//! Database connection management.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};

/// Connection to a CAIA database.
#[derive(Debug, Clone)]
pub struct CaiaDb {
    pool: SqlitePool,
}

impl CaiaDb {
    /// Open or create a database at the given path with default settings.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with(&DbConfig::at(path.as_ref())).await
    }

    /// Open or create a database described by `config`.
    ///
    /// This will:
    /// 1. Create the database file (and parent directory) if missing
    /// 2. Configure SQLite (WAL mode, foreign keys, busy timeout)
    /// 3. Run any pending migrations
    pub async fn open_with(config: &DbConfig) -> DbResult<Self> {
        if config.max_connections == 0 {
            return Err(DbError::initialization(
                "max_connections must be at least 1",
            ));
        }

        let path = config.path.as_path();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening CAIA database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .pragma("cache_size", "-64000") // 64MB cache
            .pragma("synchronous", "NORMAL") // Safe with WAL
            .pragma("temp_store", "MEMORY")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        debug!(
            max_connections = config.max_connections,
            "Database connection established"
        );

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory must be single connection to share state
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction on the pool.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get database statistics.
    pub async fn stats(&self) -> DbResult<crate::queries::DbStats> {
        crate::queries::get_stats(&self.pool).await
    }

    /// Run SQLite's integrity and foreign key checks.
    ///
    /// Returns the problems found; an empty list means the file is sound.
    pub async fn integrity_check(&self) -> DbResult<Vec<String>> {
        let mut problems: Vec<String> = sqlx::query_scalar::<_, String>("PRAGMA integrity_check")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .filter(|line| line != "ok")
            .collect();

        let dangling: Vec<(String, Option<i64>, String)> =
            sqlx::query_as("SELECT \"table\", rowid, parent FROM pragma_foreign_key_check")
                .fetch_all(&self.pool)
                .await?;
        problems.extend(dangling.into_iter().map(|(table, rowid, parent)| {
            format!(
                "{table} row {} references a missing {parent} row",
                rowid.map_or_else(|| "?".to_string(), |r| r.to_string())
            )
        }));

        if !problems.is_empty() {
            warn!(count = problems.len(), "integrity check found problems");
        }
        Ok(problems)
    }

    /// Vacuum the database to reclaim space.
    pub async fn vacuum(&self) -> DbResult<()> {
        info!("Vacuuming database");
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    /// Checkpoint the WAL file.
    pub async fn checkpoint(&self) -> DbResult<()> {
        debug!("Checkpointing WAL");
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
