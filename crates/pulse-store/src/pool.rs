//! # Store Connection
//!
//! Opens the SQLite file that holds inbound shipments and hands out
//! repositories over a shared pool.
//!
//! ```text
//! DbConfig ──► Database::new ──► SqlitePool ──► db.inbound_orders()
//!                   │
//!                   └── create parent dir, apply migrations
//! ```
//!
//! File stores run in WAL mode so a report can read while an edit is being
//! written. `:memory:` stores are pinned to one connection, since every
//! SQLite in-memory connection is a separate database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::inbound::InboundOrderRepository;

const IN_MEMORY: &str = ":memory:";

/// How to open the store.
///
/// ```rust
/// use pulse_store::DbConfig;
///
/// let config = DbConfig::new("/tmp/pulse.db").max_connections(3);
/// assert_eq!(config.max_connections, 3);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub connect_timeout: Duration,
    /// `None` keeps idle connections open forever.
    pub idle_timeout: Option<Duration>,
    /// Apply embedded migrations while opening.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(300)),
            run_migrations: true,
        }
    }

    /// A throwaway store that disappears with its pool. Used by tests.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            idle_timeout: None,
            ..Self::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        options.foreign_keys(true)
    }
}

/// Handle to an open store. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the store described by `config`.
    ///
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./inbound.db")).await?;
    /// let outstanding = db.inbound_orders().list_outstanding().await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        if !config.is_in_memory() {
            ensure_parent_dir(&config.database_path).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Inbound order store opened"
        );

        let db = Self { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies any migrations this binary carries that the store lacks.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn inbound_orders(&self) -> InboundOrderRepository {
        InboundOrderRepository::new(self.pool.clone())
    }

    /// Closes every connection. Later repository calls fail.
    pub async fn close(&self) {
        debug!("Closing inbound order store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

async fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", parent.display()))),
        _ => Ok(()),
    }
}
