//! # Repository Module
//!
//! Database repository implementations for the audit store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  InventoryWorkflow                                                     │
//! │       │                                                                 │
//! │       │  db.sessions().open(&new, Available, InInventory)              │
//! │       ▼                                                                 │
//! │  SessionRepository                                                     │
//! │  ├── get_with_zone(&self, id)                                          │
//! │  ├── list_by_branch(&self, branch_id)                                  │
//! │  ├── open(&self, new, from, to)          ── transaction + zone CAS     │
//! │  └── close_counting(&self, ...)          ── transaction + zone CAS     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ZoneRepository`](zone::ZoneRepository) - Zones and the state CAS
//! - [`ItemRepository`](item::ItemRepository) - Items and item states
//! - [`SessionRepository`](session::SessionRepository) - Inventory sessions
//! - [`VerificationRepository`](verification::VerificationRepository) - Checker decisions
//! - [`StaffRepository`](staff::StaffRepository) - Branches, users, groups, checkers

pub mod item;
pub mod session;
pub mod staff;
pub mod verification;
pub mod zone;

// =============================================================================
// Test Fixtures
// =============================================================================
