//! # Store Errors
//!
//! Everything the inbound order store can fail with. sqlx errors are folded
//! into a few categories the dashboard can act on:
//!
//! ```text
//! sqlx::Error ──► DbError ──► ServiceError::Store ──► inventory view
//!                                                     falls back to
//!                                                     on-hand stock only
//! ```

use pulse_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the requested key.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (usually a reused order id).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A CHECK constraint rejected the write.
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// Rejected before it reached SQLite.
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a retry with the same input could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::ConnectionFailed(_))
    }

    /// Classifies a SQLite error message by the constraint it names.
    fn from_sqlite_message(msg: &str) -> Self {
        const UNIQUE: &str = "UNIQUE constraint failed: ";
        const CHECK: &str = "CHECK constraint failed";

        if let Some(pos) = msg.find(UNIQUE) {
            let field = msg[pos + UNIQUE.len()..].trim();
            Self::duplicate(if field.is_empty() { "unknown" } else { field }, "unknown")
        } else if msg.contains(CHECK) {
            Self::ConstraintViolation {
                message: msg.to_string(),
            }
        } else {
            Self::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => Self::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::PoolClosed => Self::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(io) => Self::ConnectionFailed(io.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers() {
        let err = DbError::not_found("InboundOrder", "abc");
        assert_eq!(err.to_string(), "InboundOrder not found: abc");

        let err = DbError::duplicate("inbound_orders.id", "abc");
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[test]
    fn test_sqlx_mapping() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_sqlite_message_classification() {
        match DbError::from_sqlite_message("UNIQUE constraint failed: inbound_orders.id") {
            DbError::UniqueViolation { field, .. } => assert_eq!(field, "inbound_orders.id"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            DbError::from_sqlite_message("CHECK constraint failed: quantity > 0"),
            DbError::ConstraintViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("no such table: nope"),
            DbError::QueryFailed(_)
        ));
    }
}
