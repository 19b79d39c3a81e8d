//! # Scan Cache
//!
//! Holds the scans of every active session until a checker decides on it.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ScanCache                                     │
//! │                                                                         │
//! │  RwLock<HashMap<SessionId, Slot>>        (held only to find a slot)    │
//! │     │                                                                   │
//! │     ├── 12 ──► Arc<Mutex<SessionScans>>  [A-001, A-007, B-003]          │
//! │     ├── 15 ──► Arc<Mutex<SessionScans>>  []                             │
//! │     └── 19 ──► Arc<Mutex<SessionScans>>  [C-010]                        │
//! │                                                                         │
//! │  Slot lifetime: open() at Start ... clear() after Decide               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The per-session mutex is async and is held across the duplicate check and
//! the insert, so two concurrent scans of one item produce one entry. Scans
//! of different sessions never contend.
//!
//! A session with no slot is one whose scans were lost (the process restarted
//! while it was being counted); callers report that instead of treating it as
//! an empty scan list.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use stocktake_core::validation::ScanLookup;
use stocktake_core::{ItemId, ScannedItem, SessionId};

// =============================================================================
// Session Scans
// =============================================================================

/// The scans of one session, in scan order.
#[derive(Debug, Default, Clone)]
pub struct SessionScans {
    entries: Vec<ScannedItem>,
}

impl SessionScans {
    /// Appends the scan unless its item is already present.
    ///
    /// Returns `true` when the scan was stored.
    pub fn insert_if_absent(&mut self, scan: ScannedItem) -> bool {
        if self.contains_item(scan.item_id) {
            return false;
        }
        self.entries.push(scan);
        true
    }

    /// Scans in the order they were taken.
    pub fn entries(&self) -> &[ScannedItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScanLookup for SessionScans {
    fn contains_item(&self, item_id: ItemId) -> bool {
        self.entries.contains_item(item_id)
    }
}

type Slot = Arc<Mutex<SessionScans>>;

// =============================================================================
// Scan Cache
// =============================================================================

/// Process-local store of in-progress scans, one slot per session.
///
/// Injected into the workflow as `Arc<ScanCache>`.
#[derive(Debug, Default)]
pub struct ScanCache {
    slots: RwLock<HashMap<SessionId, Slot>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session_id: SessionId) -> Option<Slot> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session_id)
            .cloned()
    }

    /// Opens a fresh, empty slot, discarding anything left for the session.
    pub fn open(&self, session_id: SessionId) {
        let previous = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, Arc::new(Mutex::new(SessionScans::default())));

        if previous.is_some() {
            debug!(session_id, "Discarded stale scan slot");
        }
    }

    /// Returns true if the session has a slot.
    pub fn is_open(&self, session_id: SessionId) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&session_id)
    }

    /// Locks the session's scans for exclusive use.
    ///
    /// Returns `None` if the session has no slot.
    pub async fn lock(&self, session_id: SessionId) -> Option<OwnedMutexGuard<SessionScans>> {
        let slot = self.slot(session_id)?;
        Some(slot.lock_owned().await)
    }

    /// Adds a scan unless its item is already present.
    ///
    /// Returns false for a duplicate and for a session without a slot; only
    /// [`open`](Self::open) creates slots.
    pub async fn add(&self, session_id: SessionId, scan: ScannedItem) -> bool {
        match self.lock(session_id).await {
            Some(mut scans) => scans.insert_if_absent(scan),
            None => false,
        }
    }

    /// Point-in-time copy of the session's scans; empty for unknown sessions.
    pub async fn list(&self, session_id: SessionId) -> Vec<ScannedItem> {
        match self.slot(session_id) {
            Some(slot) => slot.lock().await.entries().to_vec(),
            None => Vec::new(),
        }
    }

    /// Returns true if the item was scanned in the session.
    pub async fn exists(&self, session_id: SessionId, item_id: ItemId) -> bool {
        match self.slot(session_id) {
            Some(slot) => slot.lock().await.contains_item(item_id),
            None => false,
        }
    }

    /// Number of scans held for the session.
    pub async fn len(&self, session_id: SessionId) -> usize {
        match self.slot(session_id) {
            Some(slot) => slot.lock().await.len(),
            None => 0,
        }
    }

    /// Removes the session's slot.
    pub fn clear(&self, session_id: SessionId) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session_id);
    }

    /// Number of sessions holding a slot.
    pub fn active_sessions(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
