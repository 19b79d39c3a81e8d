//! # Service Error Handling
//!
//! The error shape every workflow operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow to Callers                                │
//! │                                                                         │
//! │  stocktake-core                stocktake-db                             │
//! │  CoreError (kind())            DbError                                  │
//! │       │                            │                                    │
//! │       └──────────┬─────────────────┘                                    │
//! │                  ▼                                                      │
//! │            ServiceError { code, message }                               │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  {"code": "INVALID_STATE", "message": "Zone 3 is available, ..."}      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Storage details are logged, never returned.

use serde::Serialize;
use stocktake_core::{CoreError, ErrorKind, ValidationError};
use stocktake_db::DbError;
use ts_rs::TS;

/// Error returned from workflow operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "Item A-001 was already scanned in session 12"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for workflow responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced record absent (404)
    NotFound,

    /// Zone is in the wrong state for the operation (409)
    InvalidState,

    /// Duplicate scan or second verification (409)
    Conflict,

    /// Wrong role or wrong branch (403)
    Forbidden,

    /// Input validation failed (400)
    ValidationError,

    /// Scans of an active session were lost; recount required (410)
    ScanDataLost,

    /// Database operation failed (500, or 503 when busy)
    DatabaseError,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::ScanDataLost => ErrorCode::ScanDataLost,
        }
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::new(err.kind().into(), err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

/// Converts database errors to service errors.
///
/// Constraint and lock failures keep a meaningful code; everything else is
/// logged and reported as a generic `DATABASE_ERROR`.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::StaleState {
                entity,
                id,
                expected,
            } => ServiceError::new(
                ErrorCode::InvalidState,
                format!("{} {} is no longer {}", entity, id, expected),
            ),
            DbError::UniqueViolation { column } => {
                ServiceError::new(ErrorCode::Conflict, format!("{} already exists", column))
            }
            DbError::ForeignKeyViolation(message) => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConstraintViolation(message) => {
                tracing::error!("Constraint violation: {}", message);
                ServiceError::new(ErrorCode::ValidationError, "Invalid value")
            }
            DbError::Locked(message) => {
                tracing::warn!("Database locked past busy timeout: {}", message);
                ServiceError::new(ErrorCode::DatabaseError, "Database busy, try again")
            }
            DbError::PoolTimedOut => {
                tracing::warn!("No database connection available");
                ServiceError::new(ErrorCode::DatabaseError, "Database busy, try again")
            }
            DbError::ConnectionFailed(e) | DbError::MigrationFailed(e) | DbError::Query(e) => {
                tracing::error!("Database operation failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for workflow operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
