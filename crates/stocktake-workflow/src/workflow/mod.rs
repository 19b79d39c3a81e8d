//! # Inventory Workflow
//!
//! The operations of a zone audit, each a precondition sequence followed by
//! a single mutation.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Zone Audit Flow                                 │
//! │                                                                         │
//! │  Area manager          Operator                 Checker                 │
//! │  ────────────          ────────                 ───────                 │
//! │  start(zone, group)                                                     │
//! │    zone → in_inventory                                                  │
//! │    cache slot opened                                                    │
//! │                        scan(code, state) × N                            │
//! │                          cache only, no durable write                   │
//! │                        finish(note)                                     │
//! │                          zone → in_verification                         │
//! │                                                 pending(branch)         │
//! │                                                 compare(session)        │
//! │                                                 decide(approve?)        │
//! │                                                   zone → available      │
//! │                                                   cache slot removed    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check runs before the mutation, so a failed call leaves neither the
//! cache nor the store changed.

mod finish;
mod recover;
mod scan;
mod start;
mod verify;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use stocktake_core::{CoreError, SessionId, SessionWithZone};

use crate::cache::ScanCache;
use crate::config::WorkflowSettings;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

pub use finish::{FinishCountRequest, FinishCountResponse};
pub use recover::RecoverResponse;
pub use scan::{ScanItemRequest, ScanItemResponse};
pub use start::{StartCountRequest, StartCountResponse};
pub use verify::{DecideRequest, DecideResponse};

/// Entry point for every audit operation.
///
/// Holds the store and the scan cache; cloning shares both.
pub struct InventoryWorkflow<S> {
    store: Arc<S>,
    cache: Arc<ScanCache>,
    settings: WorkflowSettings,
}

impl<S> Clone for InventoryWorkflow<S> {
    fn clone(&self) -> Self {
        InventoryWorkflow {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            settings: self.settings,
        }
    }
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    pub fn new(store: Arc<S>, cache: Arc<ScanCache>, settings: WorkflowSettings) -> Self {
        InventoryWorkflow {
            store,
            cache,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    /// Reads the session snapshot or fails with `NotFound`.
    async fn load_session(&self, session_id: SessionId) -> ServiceResult<SessionWithZone> {
        self.store
            .session_with_zone(session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Session", session_id).into())
    }
}
