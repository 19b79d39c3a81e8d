//! # stocktake-db: Database Layer for the Zone Audit Workflow
//!
//! SQLite persistence for zones, items, sessions, verifications and the
//! staff tables the workflow reads. Built on sqlx with runtime queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stocktake Data Flow                              │
//! │                                                                         │
//! │  InventoryWorkflow (stocktake-workflow)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stocktake-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ zone, item,        │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ session, staff,    │  │ 001_*.sql  │  │   │
//! │  │   │               │    │ verification       │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//!
//! Every write that moves a zone between states runs in one transaction
//! together with the rows it creates, and guards the zone update with a
//! compare-and-set on the current state. A lost race surfaces as
//! [`DbError::StaleState`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stocktake_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stocktake.db")).await?;
//! let zone = db.zones().get_by_id(3).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::item::ItemRepository;
pub use repository::session::SessionRepository;
pub use repository::staff::StaffRepository;
pub use repository::verification::VerificationRepository;
pub use repository::zone::ZoneRepository;
