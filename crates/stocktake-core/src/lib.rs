//! # stocktake-core: Pure Audit Logic
//!
//! This crate is the **heart** of the zone audit workflow. It contains the
//! zone state machine, the inventory validator and the reconciliation
//! algorithm as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stocktake Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               HTTP / IPC layer (not in this workspace)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stocktake-workflow                             │   │
//! │  │    start, scan, finish, pending, compare, decide + ScanCache    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stocktake-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation │  │ reconcile │  │  session  │  │   │
//! │  │   │ ZoneState │  │  ensure_*  │  │  Report   │  │  helpers  │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stocktake-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Zone, Session, ScannedItem, Verification, ...)
//! - [`error`] - Domain error types and the error taxonomy
//! - [`validation`] - Precondition checks for every transition
//! - [`reconcile`] - Scan vs. expected comparison report
//! - [`session`] - Observation log and pending-verification queue
//!
//! ## Example Usage
//!
//! ```rust
//! use stocktake_core::{ZoneEvent, ZoneState};
//!
//! let state = ZoneState::Available.apply(ZoneEvent::StartCount).unwrap();
//! assert_eq!(state, ZoneState::InInventory);
//!
//! // Verification can't close a zone that is still being counted
//! assert!(state.apply(ZoneEvent::CloseVerification).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod reconcile;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use reconcile::{reconcile, ComparisonReport, ReportItem, StateCatalog, StateMismatch};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a scanned item code.
pub const MAX_ITEM_CODE_LEN: usize = 64;

/// Maximum length of any observation text (session or verification).
///
/// Mirrors the column limit enforced by the store.
pub const MAX_OBSERVATION_LEN: usize = 2000;
