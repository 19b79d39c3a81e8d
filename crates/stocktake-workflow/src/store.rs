//! # Inventory Store
//!
//! The persistence seam of the workflow. [`Database`] is the production
//! implementation; tests can supply their own.
//!
//! ## Atomic Writes
//! ```text
//! open_session          INSERT session          + zone available       → in_inventory
//! close_counting        UPDATE observations     + zone in_inventory    → in_verification
//! record_verification   INSERT verification,
//!                       INSERT details, items   + zone in_verification → available
//! ```
//! Each call is one transaction. The zone move is a compare-and-set on
//! `from`; losing the race surfaces as an `InvalidState` (or `Conflict` for a
//! second verification).

use async_trait::async_trait;

use stocktake_core::{
    BranchId, Checker, CoreError, GroupId, Item, ItemState, ItemStateId, NewSession,
    OperatingGroup, Session, SessionId, SessionWithZone, UserId, Verification,
    VerificationOutcome, Zone, ZoneId, ZoneState,
};
use stocktake_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};

/// Everything the workflow reads from and writes to durable storage.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn session_with_zone(&self, session_id: SessionId)
        -> ServiceResult<Option<SessionWithZone>>;

    async fn item_by_code(&self, code: &str) -> ServiceResult<Option<Item>>;

    async fn zone(&self, zone_id: ZoneId) -> ServiceResult<Option<Zone>>;

    /// Items registered to the zone; the expected set of a count.
    async fn zone_items(&self, zone_id: ZoneId) -> ServiceResult<Vec<Item>>;

    async fn item_states(&self) -> ServiceResult<Vec<ItemState>>;

    async fn item_state(&self, id: ItemStateId) -> ServiceResult<Option<ItemState>>;

    async fn operating_group(&self, group_id: GroupId) -> ServiceResult<Option<OperatingGroup>>;

    async fn checker_by_user(&self, user_id: UserId) -> ServiceResult<Option<Checker>>;

    async fn sessions_by_branch(&self, branch_id: BranchId)
        -> ServiceResult<Vec<SessionWithZone>>;

    /// Creates the session and moves its zone `from` → `to` atomically.
    async fn open_session(
        &self,
        new: &NewSession,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<Session>;

    /// Stores the final observation log and moves the zone atomically.
    async fn close_counting(
        &self,
        session_id: SessionId,
        zone_id: ZoneId,
        observations: &str,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<()>;

    /// Persists a checker decision and moves the zone atomically.
    async fn record_verification(
        &self,
        outcome: &VerificationOutcome,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<Verification>;
}

/// Maps a lost compare-and-set on a zone to the domain error.
fn zone_moved(err: DbError, zone_id: ZoneId, expected: ZoneState) -> ServiceError {
    match err {
        DbError::StaleState { .. } => CoreError::ZoneStateChanged { zone_id, expected }.into(),
        other => other.into(),
    }
}

#[async_trait]
impl InventoryStore for Database {
    async fn session_with_zone(
        &self,
        session_id: SessionId,
    ) -> ServiceResult<Option<SessionWithZone>> {
        Ok(self.sessions().get_with_zone(session_id).await?)
    }

    async fn item_by_code(&self, code: &str) -> ServiceResult<Option<Item>> {
        Ok(self.items().get_by_code(code).await?)
    }

    async fn zone(&self, zone_id: ZoneId) -> ServiceResult<Option<Zone>> {
        Ok(self.zones().get_by_id(zone_id).await?)
    }

    async fn zone_items(&self, zone_id: ZoneId) -> ServiceResult<Vec<Item>> {
        Ok(self.items().list_by_zone(zone_id).await?)
    }

    async fn item_states(&self) -> ServiceResult<Vec<ItemState>> {
        Ok(self.items().list_states().await?)
    }

    async fn item_state(&self, id: ItemStateId) -> ServiceResult<Option<ItemState>> {
        Ok(self.items().get_state(id).await?)
    }

    async fn operating_group(&self, group_id: GroupId) -> ServiceResult<Option<OperatingGroup>> {
        Ok(self.staff().operating_group(group_id).await?)
    }

    async fn checker_by_user(&self, user_id: UserId) -> ServiceResult<Option<Checker>> {
        Ok(self.staff().checker_by_user(user_id).await?)
    }

    async fn sessions_by_branch(
        &self,
        branch_id: BranchId,
    ) -> ServiceResult<Vec<SessionWithZone>> {
        Ok(self.sessions().list_by_branch(branch_id).await?)
    }

    async fn open_session(
        &self,
        new: &NewSession,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<Session> {
        self.sessions()
            .open(new, from, to)
            .await
            .map_err(|e| zone_moved(e, new.zone_id, from))
    }

    async fn close_counting(
        &self,
        session_id: SessionId,
        zone_id: ZoneId,
        observations: &str,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<()> {
        self.sessions()
            .close_counting(session_id, zone_id, observations, from, to)
            .await
            .map_err(|e| zone_moved(e, zone_id, from))
    }

    async fn record_verification(
        &self,
        outcome: &VerificationOutcome,
        from: ZoneState,
        to: ZoneState,
    ) -> ServiceResult<Verification> {
        let session_id = outcome.verification.session_id;

        self.verifications()
            .record(outcome, from, to)
            .await
            .map_err(|e| match e {
                // Another checker got there first
                DbError::StaleState { .. } => CoreError::AlreadyVerified(session_id).into(),
                e if e.is_unique_violation_on("verifications.session_id") => {
                    CoreError::AlreadyVerified(session_id).into()
                }
                other => other.into(),
            })
    }
}
