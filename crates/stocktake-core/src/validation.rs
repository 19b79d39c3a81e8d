//! # Validation Module
//!
//! The inventory validator: precondition checks for every workflow transition.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input (this module, validate_*)                              │
//! │  ├── Item codes, observation lengths, ids                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Rules (this module, ensure_*)                                │
//! │  ├── Zone state, duplicates, branch ownership, prior verification      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── Compare-and-set on zones.state                                    │
//! │  ├── UNIQUE (verifications.session_id)                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: it reads the snapshot the caller passes in
//! and never touches storage. Workflows run all of them before mutating
//! anything.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{
    Checker, Item, ItemId, Role, ScanClassification, ScannedItem, SessionId, SessionWithZone,
    Zone, ZoneState,
};
use crate::{MAX_ITEM_CODE_LEN, MAX_OBSERVATION_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Input Validators
// =============================================================================

/// Validates a scanned item code and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
///
/// ## Example
/// ```rust
/// use stocktake_core::validation::validate_item_code;
///
/// assert_eq!(validate_item_code("  CHAIR-01 ").unwrap(), "CHAIR-01");
/// assert!(validate_item_code("").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item code".to_string(),
        });
    }

    if code.chars().count() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    Ok(code.to_string())
}

/// Validates free-text observations.
///
/// Empty text is allowed; the store's column limit is mirrored by
/// `MAX_OBSERVATION_LEN`.
pub fn validate_observations(text: &str) -> ValidationResult<()> {
    if text.chars().count() > MAX_OBSERVATION_LEN {
        return Err(ValidationError::TooLong {
            field: "observations".to_string(),
            max: MAX_OBSERVATION_LEN,
        });
    }

    Ok(())
}

/// Validates that an identifier is a positive row id.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Zone State Rules
// =============================================================================

fn ensure_zone_state(zone: &Zone, expected: ZoneState) -> CoreResult<()> {
    if zone.state != expected {
        return Err(CoreError::InvalidZoneState {
            zone_id: zone.id,
            current: zone.state,
            expected,
        });
    }

    Ok(())
}

/// Fails with `InvalidState` if a later session has been opened on the zone.
///
/// The zone's state belongs to its newest session; older ones are read-only.
pub fn ensure_current_session(session: &SessionWithZone) -> CoreResult<()> {
    if !session.is_current() {
        return Err(CoreError::SessionSuperseded {
            session_id: session.session.id,
            zone_id: session.zone.id,
            current: session.current_session_id,
        });
    }

    Ok(())
}

/// Fails with `InvalidState` unless this session is the one counting the zone.
pub fn ensure_in_progress(session: &SessionWithZone) -> CoreResult<()> {
    ensure_current_session(session)?;
    ensure_zone_state(&session.zone, ZoneState::InInventory)
}

/// Fails with `InvalidState` unless the zone is idle.
pub fn ensure_zone_available(zone: &Zone) -> CoreResult<()> {
    ensure_zone_state(zone, ZoneState::Available)
}

/// Fails with `InvalidState` unless the session's count is finished and
/// waiting for a checker.
pub fn ensure_pending_verification(session: &SessionWithZone) -> CoreResult<()> {
    ensure_current_session(session)?;
    ensure_zone_state(&session.zone, ZoneState::InVerification)
}

// =============================================================================
// Scan Rules
// =============================================================================

/// Read access to the scans already recorded for one session.
///
/// Implemented by the workflow's scan cache; slices implement it too so the
/// rule can be checked against any snapshot.
pub trait ScanLookup {
    /// Returns true if the item was already scanned.
    fn contains_item(&self, item_id: ItemId) -> bool;
}

impl ScanLookup for [ScannedItem] {
    fn contains_item(&self, item_id: ItemId) -> bool {
        self.iter().any(|scan| scan.item_id == item_id)
    }
}

impl ScanLookup for Vec<ScannedItem> {
    fn contains_item(&self, item_id: ItemId) -> bool {
        self.as_slice().contains_item(item_id)
    }
}

/// Turns an optional lookup result into the item or `NotFound`.
pub fn ensure_item_exists(item: Option<Item>, code: &str) -> CoreResult<Item> {
    item.ok_or_else(|| CoreError::not_found("Item", code))
}

/// Fails with `Conflict` if the item is already in the session's scans.
pub fn ensure_not_duplicate<L>(session_id: SessionId, item: &Item, scans: &L) -> CoreResult<()>
where
    L: ScanLookup + ?Sized,
{
    if scans.contains_item(item.id) {
        return Err(CoreError::DuplicateScan {
            session_id,
            item_code: item.code.clone(),
        });
    }

    Ok(())
}

/// Classifies a scan by comparing the item's owning zone with the zone
/// being counted.
pub fn classify_zone(item: &Item, zone: &Zone) -> ScanClassification {
    if item.zone_id == zone.id {
        ScanClassification::Correct
    } else {
        ScanClassification::WrongZone
    }
}

// =============================================================================
// Verification Rules
// =============================================================================

/// Fails with `Conflict` if a checker already decided on the session.
pub fn ensure_not_already_verified(session: &SessionWithZone) -> CoreResult<()> {
    if session.is_verified() {
        return Err(CoreError::AlreadyVerified(session.session.id));
    }

    Ok(())
}

/// Fails with `Forbidden` unless the acting role is the checker role.
pub fn ensure_checker_role(role: Role) -> CoreResult<()> {
    if role != Role::Checker {
        return Err(CoreError::RoleNotAllowed {
            role,
            action: "verify an inventory".to_string(),
        });
    }

    Ok(())
}

/// Fails with `Forbidden` if the checker audits another branch.
pub fn ensure_same_branch(checker: &Checker, session: &SessionWithZone) -> CoreResult<()> {
    if checker.branch_id != session.zone.branch_id {
        return Err(CoreError::CrossBranch {
            checker_id: checker.id,
            checker_branch: checker.branch_id,
            zone_branch: session.zone.branch_id,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
