//! # Domain Types
//!
//! Core domain types used throughout the audit workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Zone       │   │     Session     │   │  Verification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  zone_id        │◄──│  session_id     │       │
//! │  │  branch_id      │   │  group_id       │   │  checker_id     │       │
//! │  │  state          │   │  observations   │   │  approved       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │          ▲                      ▲                                       │
//! │  ┌───────┴─────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │   ScannedItem   │   │ InventoryDetail │       │
//! │  │  code, name     │   │  (cache only)   │   │ (approval only) │       │
//! │  │  state_id       │   │  classification │   │  state_id       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! Every identifier is an `i64` row id assigned by the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

pub type BranchId = i64;
pub type ZoneId = i64;
pub type ItemId = i64;
pub type ItemStateId = i64;
pub type SessionId = i64;
pub type GroupId = i64;
pub type UserId = i64;
pub type CheckerId = i64;
pub type VerificationId = i64;

// =============================================================================
// Zone State Machine
// =============================================================================

/// Availability of a zone for counting.
///
/// ## Lifecycle
/// ```text
///            StartCount            FinishCount
///  Available ──────────► InInventory ──────────► InVerification
///      ▲                                               │
///      └───────────────── CloseVerification ───────────┘
/// ```
/// No other edge exists. [`ZoneState::apply`] is total over every
/// (state, event) pair, so an illegal pair is an error value, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ZoneState {
    /// Idle; a new count may start.
    Available,
    /// A session is counting the zone.
    InInventory,
    /// Counting finished; waiting for a checker.
    InVerification,
}

impl ZoneState {
    /// Applies a workflow event and returns the next state.
    pub fn apply(self, event: ZoneEvent) -> CoreResult<ZoneState> {
        match (self, event) {
            (ZoneState::Available, ZoneEvent::StartCount) => Ok(ZoneState::InInventory),
            (ZoneState::InInventory, ZoneEvent::FinishCount) => Ok(ZoneState::InVerification),
            (ZoneState::InVerification, ZoneEvent::CloseVerification) => Ok(ZoneState::Available),
            (ZoneState::Available, ZoneEvent::FinishCount | ZoneEvent::CloseVerification)
            | (ZoneState::InInventory, ZoneEvent::StartCount | ZoneEvent::CloseVerification)
            | (ZoneState::InVerification, ZoneEvent::StartCount | ZoneEvent::FinishCount) => {
                Err(CoreError::IllegalTransition { state: self, event })
            }
        }
    }

    /// The state an event must be applied from.
    pub fn source_of(event: ZoneEvent) -> ZoneState {
        match event {
            ZoneEvent::StartCount => ZoneState::Available,
            ZoneEvent::FinishCount => ZoneState::InInventory,
            ZoneEvent::CloseVerification => ZoneState::InVerification,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneState::Available => "available",
            ZoneState::InInventory => "in_inventory",
            ZoneState::InVerification => "in_verification",
        }
    }
}

impl Default for ZoneState {
    fn default() -> Self {
        ZoneState::Available
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transitions a workflow operation asks of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEvent {
    /// Start: open a session.
    StartCount,
    /// Finish: stop counting, wait for a checker.
    FinishCount,
    /// Decide: checker approved or rejected the count.
    CloseVerification,
}

impl fmt::Display for ZoneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ZoneEvent::StartCount => "start a count",
            ZoneEvent::FinishCount => "finish a count",
            ZoneEvent::CloseVerification => "close a verification",
        };
        f.write_str(text)
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Role of the acting user, as resolved by the (external) auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    AreaManager,
    Operator,
    Checker,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Role::Admin => "admin",
            Role::AreaManager => "area_manager",
            Role::Operator => "operator",
            Role::Checker => "checker",
        };
        f.write_str(text)
    }
}

// =============================================================================
// Master Data
// =============================================================================

/// A physical area whose items are periodically counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub branch_id: BranchId,
    /// The single area manager responsible for the zone.
    pub area_manager_id: UserId,
    pub state: ZoneState,
}

/// A physical asset located in exactly one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    /// Business identifier printed on the label (what gets scanned).
    pub code: String,
    pub name: String,
    pub zone_id: ZoneId,
    /// Current condition; the expected state during reconciliation.
    pub state_id: ItemStateId,
}

/// Catalogue entry for an item condition ("ok", "damaged", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemState {
    pub id: ItemStateId,
    pub label: String,
}

/// The team performing a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OperatingGroup {
    pub id: GroupId,
    pub name: String,
    pub branch_id: BranchId,
}

/// Auditor profile attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Checker {
    pub id: CheckerId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub name: String,
}

// =============================================================================
// Inventory Session
// =============================================================================

/// One audit attempt against a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    pub id: SessionId,
    pub zone_id: ZoneId,
    pub group_id: GroupId,
    pub started_by: UserId,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    /// Append-only free text; Finish adds the closing note.
    pub observations: String,
}

/// A session as read together with its zone.
///
/// This is the snapshot every validator check runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionWithZone {
    pub session: Session,
    pub zone: Zone,
    /// Set once a checker has decided on the session.
    pub verification_id: Option<VerificationId>,
    /// Newest session opened on the zone. Only that one may still act on it.
    pub current_session_id: SessionId,
}

impl SessionWithZone {
    #[inline]
    pub fn is_verified(&self) -> bool {
        self.verification_id.is_some()
    }

    /// True when no later session has been opened on the zone.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.session.id == self.current_session_id
    }
}

/// Input for creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub zone_id: ZoneId,
    pub group_id: GroupId,
    pub started_by: UserId,
    pub started_at: DateTime<Utc>,
    pub observations: String,
}

// =============================================================================
// Scans
// =============================================================================

/// Whether a scanned item belongs to the zone being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanClassification {
    /// The item's owning zone is the session's zone.
    Correct,
    /// The item is registered to another zone.
    WrongZone,
}

impl ScanClassification {
    #[inline]
    pub fn is_correct(&self) -> bool {
        matches!(self, ScanClassification::Correct)
    }
}

impl fmt::Display for ScanClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanClassification::Correct => f.write_str("correct"),
            ScanClassification::WrongZone => f.write_str("wrong_zone"),
        }
    }
}

/// One scan held in the session cache.
///
/// ## Snapshot Pattern
/// Code and name are copied from the item at scan time so a report can name
/// items that do not belong to the zone being counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScannedItem {
    pub item_id: ItemId,
    pub item_code: String,
    pub item_name: String,
    /// State declared by the operator.
    pub state_id: ItemStateId,
    pub classification: ScanClassification,
    #[ts(as = "String")]
    pub scanned_at: DateTime<Utc>,
}

// =============================================================================
// Verification Outcome
// =============================================================================

/// The durable auditor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Verification {
    pub id: VerificationId,
    pub session_id: SessionId,
    pub checker_id: CheckerId,
    pub approved: bool,
    pub observations: String,
    #[ts(as = "String")]
    pub verified_at: DateTime<Utc>,
}

/// Input for creating a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVerification {
    pub session_id: SessionId,
    pub checker_id: CheckerId,
    pub approved: bool,
    pub observations: String,
    pub verified_at: DateTime<Utc>,
}

/// An accepted scan made durable on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryDetail {
    pub id: i64,
    pub session_id: SessionId,
    pub item_id: ItemId,
    pub state_id: ItemStateId,
}

/// Input for creating an inventory detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryDetail {
    pub session_id: SessionId,
    pub item_id: ItemId,
    pub state_id: ItemStateId,
}

/// Everything Decide persists in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub zone_id: ZoneId,
    pub verification: NewVerification,
    /// Empty on rejection.
    pub details: Vec<NewInventoryDetail>,
}

impl VerificationOutcome {
    /// Builds the outcome of a checker decision over the session's scans.
    ///
    /// Only `Correct` scans become details, and only when approved.
    pub fn from_scans(
        zone_id: ZoneId,
        verification: NewVerification,
        scans: &[ScannedItem],
    ) -> Self {
        let details = if verification.approved {
            scans
                .iter()
                .filter(|scan| scan.classification.is_correct())
                .map(|scan| NewInventoryDetail {
                    session_id: verification.session_id,
                    item_id: scan.item_id,
                    state_id: scan.state_id,
                })
                .collect()
        } else {
            Vec::new()
        };

        VerificationOutcome {
            zone_id,
            verification,
            details,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
