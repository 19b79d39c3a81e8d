//! # stocktake-workflow: Zone Audit Orchestration
//!
//! Wires the pure rules of `stocktake-core` to the SQLite store of
//! `stocktake-db` and holds the in-memory scan cache.
//!
//! ## Module Organization
//!
//! - [`workflow`] - `InventoryWorkflow` and its operations
//! - [`cache`] - Per-session scan cache with async locks
//! - [`store`] - `InventoryStore` trait (implemented by `Database`)
//! - [`error`] - `ServiceError` / `ErrorCode`
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stocktake_db::Database;
//! use stocktake_workflow::{logging, AuditConfig, InventoryWorkflow, ScanCache};
//!
//! let config = AuditConfig::load(None)?;
//! logging::init_tracing(&config.logging.filter);
//!
//! let db = Database::new(config.db_config()).await?;
//! let workflow = InventoryWorkflow::new(
//!     Arc::new(db),
//!     Arc::new(ScanCache::new()),
//!     config.workflow,
//! );
//!
//! let started = workflow.start(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod workflow;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{ScanCache, SessionScans};
pub use config::{AuditConfig, ConfigError, WorkflowSettings};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use store::InventoryStore;
pub use workflow::{
    DecideRequest, DecideResponse, FinishCountRequest, FinishCountResponse, InventoryWorkflow,
    RecoverResponse, ScanItemRequest, ScanItemResponse, StartCountRequest, StartCountResponse,
};
