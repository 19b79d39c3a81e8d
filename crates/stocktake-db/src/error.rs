//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← constraint kind, lock contention, stale compare-and-set     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (stocktake-workflow) ← code + message for callers        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind as SqlErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A compare-and-set update matched no row.
    ///
    /// ## When This Occurs
    /// - Zone state changed between the caller's read and the write
    ///   (two Start calls racing on one zone)
    #[error("{entity} {id} is no longer {expected}")]
    StaleState {
        entity: String,
        id: String,
        expected: String,
    },

    /// UNIQUE index violation on `table.column`.
    ///
    /// ## When This Occurs
    /// - Second verification for the same session
    /// - Duplicate item code
    #[error("Duplicate value for {column}")]
    UniqueViolation { column: String },

    /// Referencing a non-existent zone, item, state or checker.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// CHECK or NOT NULL constraint rejected a row (e.g. unknown zone state).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// SQLite stayed locked past the busy timeout.
    #[error("Database is locked: {0}")]
    Locked(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Timed out waiting for a database connection")]
    PoolTimedOut,

    /// Database could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other query failure.
    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a StaleState error.
    pub fn stale(entity: impl Into<String>, id: impl ToString, expected: impl ToString) -> Self {
        DbError::StaleState {
            entity: entity.into(),
            id: id.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Returns true if this is a UNIQUE violation on the given `table.column`.
    pub fn is_unique_violation_on(&self, target: &str) -> bool {
        matches!(self, DbError::UniqueViolation { column } if column == target)
    }
}

/// SQLite's message is `UNIQUE constraint failed: <table>.<column>`.
fn unique_column(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| message.to_string())
}

/// SQLITE_BUSY (5) and its extended codes, SQLITE_LOCKED (6).
fn is_lock_code(code: &str) -> bool {
    matches!(code, "5" | "6" | "261" | "517" | "262")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    SqlErrorKind::UniqueViolation => DbError::UniqueViolation {
                        column: unique_column(&message),
                    },
                    SqlErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation(message),
                    SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation(message)
                    }
                    _ if db_err.code().is_some_and(|code| is_lock_code(&code)) => {
                        DbError::Locked(message)
                    }
                    _ => DbError::Query(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolTimedOut,

            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_message() {
        let err = DbError::stale("Zone", 4, "available");
        assert_eq!(err.to_string(), "Zone 4 is no longer available");
    }

    #[test]
    fn test_unique_column_from_message() {
        assert_eq!(
            unique_column("UNIQUE constraint failed: verifications.session_id"),
            "verifications.session_id"
        );

        let err = DbError::UniqueViolation {
            column: unique_column("UNIQUE constraint failed: items.code"),
        };
        assert!(err.is_unique_violation_on("items.code"));
        assert!(!err.is_unique_violation_on("verifications.session_id"));
    }

    #[test]
    fn test_lock_codes() {
        assert!(is_lock_code("5"));
        assert!(is_lock_code("517"));
        assert!(!is_lock_code("2067"));
    }
}
