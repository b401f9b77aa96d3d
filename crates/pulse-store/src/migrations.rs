//! # Schema Migrations
//!
//! The inbound order schema lives in `migrations/sqlite/` at the workspace
//! root and is compiled into the binary, so a fresh install needs nothing
//! but a writable path.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_inbound_orders.sql   inbound_orders + sku/status/arrival indexes
//! ```
//!
//! New schema changes go in a new numbered file. Applied files are
//! checksummed by sqlx; editing one breaks every existing store.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a store's schema is behind the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migrations compiled into this binary.
    pub embedded: usize,
    /// Migrations recorded as successful in the store.
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }

    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }
}

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Inbound store schema is current");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;

    info!(applied = before.pending(), "Inbound store schema migrated");
    Ok(())
}

/// Counts embedded and applied migrations.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    // `_sqlx_migrations` does not exist before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied.max(0) as usize,
    })
}
