//! # Error Types
//!
//! Domain-specific error types for stocktake-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stocktake-core errors (this file)                                     │
//! │  ├── CoreError        - Rule violations (state, conflict, forbidden)    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stocktake-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stocktake-workflow errors                                             │
//! │  └── ServiceError     - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← DbError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! Every [`CoreError`] belongs to exactly one [`ErrorKind`]. None of them are
//! retried internally: the caller must issue a corrected request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Role, SessionId, ZoneEvent, ZoneId, ZoneState};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wrong zone/session state for the requested transition.
    InvalidState,
    /// Unknown item, zone, session, checker, group or item state.
    NotFound,
    /// Duplicate scan or already-verified session.
    Conflict,
    /// Wrong role or cross-branch checker.
    Forbidden,
    /// Malformed input.
    Validation,
    /// The in-memory scans of an active session are gone (process restart).
    ScanDataLost,
}

// =============================================================================
// Core Error
// =============================================================================

/// Audit rule violations.
///
/// Every precondition check in [`crate::validation`] returns one of these
/// before any mutation happens, so an error never leaves partial effects.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The zone is not in the state the operation needs.
    ///
    /// ## When This Occurs
    /// - Scanning after Finish (zone is `in_verification`)
    /// - Starting a count on a zone that is already being counted
    /// - Verifying a session whose count was never finished
    #[error("Zone {zone_id} is {current}, expected {expected}")]
    InvalidZoneState {
        zone_id: ZoneId,
        current: ZoneState,
        expected: ZoneState,
    },

    /// A later session owns the zone; this one is closed for good.
    #[error("Session {session_id} is closed; zone {zone_id} belongs to session {current}")]
    SessionSuperseded {
        session_id: SessionId,
        zone_id: ZoneId,
        current: SessionId,
    },

    /// The zone state machine has no edge for this event.
    #[error("Cannot {event} while zone is {state}")]
    IllegalTransition { state: ZoneState, event: ZoneEvent },

    /// The zone moved under us between the precondition check and the write.
    ///
    /// ## When This Occurs
    /// Two Start (or two Decide) calls race on the same zone; the store's
    /// compare-and-set lets only one of them through.
    #[error("Zone {zone_id} is no longer {expected}")]
    ZoneStateChanged { zone_id: ZoneId, expected: ZoneState },

    /// Entity cannot be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The item is already in this session's scan list.
    #[error("Item {item_code} was already scanned in session {session_id}")]
    DuplicateScan {
        session_id: SessionId,
        item_code: String,
    },

    /// A verification record already exists for the session.
    #[error("Session {0} has already been verified")]
    AlreadyVerified(SessionId),

    /// The acting role may not perform the operation.
    #[error("Role {role} is not allowed to {action}")]
    RoleNotAllowed { role: Role, action: String },

    /// The checker audits a different branch than the zone belongs to.
    #[error("Checker {checker_id} belongs to branch {checker_branch}, zone belongs to branch {zone_branch}")]
    CrossBranch {
        checker_id: i64,
        checker_branch: i64,
        zone_branch: i64,
    },

    /// The session's in-memory scans are gone.
    ///
    /// ## When This Occurs
    /// The process restarted while the zone was being counted. The operator
    /// must acknowledge the loss (recover) and count again.
    #[error("Scans for session {0} were lost; the zone must be recounted")]
    ScanDataLost(SessionId),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidZoneState { .. }
            | CoreError::IllegalTransition { .. }
            | CoreError::SessionSuperseded { .. }
            | CoreError::ZoneStateChanged { .. } => ErrorKind::InvalidState,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::DuplicateScan { .. } | CoreError::AlreadyVerified(_) => ErrorKind::Conflict,
            CoreError::RoleNotAllowed { .. } | CoreError::CrossBranch { .. } => ErrorKind::Forbidden,
            CoreError::ScanDataLost(_) => ErrorKind::ScanDataLost,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before business rules run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
