//! Verify: the checker's side of the audit (pending queue, compare, decide).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use stocktake_core::session::pending_verifications;
use stocktake_core::validation::{
    ensure_checker_role, ensure_not_already_verified, ensure_pending_verification,
    ensure_same_branch, validate_id, validate_observations,
};
use stocktake_core::{
    reconcile, BranchId, ComparisonReport, CoreError, NewVerification, Role, ScannedItem,
    SessionId, SessionWithZone, StateCatalog, UserId, VerificationId, VerificationOutcome,
    ZoneEvent, ZoneState,
};

use super::InventoryWorkflow;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub session_id: SessionId,
    pub approved: bool,
    #[serde(default)]
    pub observations: String,
    /// Acting role and user, as resolved by the auth layer.
    pub role: Role,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    pub verification_id: VerificationId,
    pub approved: bool,
    /// Inventory details written (zero on rejection).
    pub details_recorded: usize,
    pub zone_state: ZoneState,
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    /// Sessions of a branch waiting for a checker: one per zone in
    /// `in_verification`, the most recently started one.
    pub async fn pending(&self, branch_id: BranchId) -> ServiceResult<Vec<SessionWithZone>> {
        debug!(branch_id, "pending");

        validate_id("branch_id", branch_id)?;

        let sessions = self.store.sessions_by_branch(branch_id).await?;
        Ok(pending_verifications(sessions))
    }

    /// Reconciles the session's scans with the zone's registered items.
    ///
    /// Read-only; calling it twice on unchanged data gives equal reports.
    pub async fn compare(&self, session_id: SessionId) -> ServiceResult<ComparisonReport> {
        debug!(session_id, "compare");

        let session = self.load_session(session_id).await?;
        ensure_pending_verification(&session)?;

        let scans = self.scans_or_lost(session_id).await?;

        let expected = self.store.zone_items(session.zone.id).await?;
        let states: StateCatalog = self.store.item_states().await?.into_iter().collect();

        let report = reconcile(&session, &expected, &scans, &states);
        debug!(session_id, summary = %report.summary, "Comparison built");

        Ok(report)
    }

    /// Records the checker's approval or rejection and releases the zone.
    ///
    /// ## Checks (in order)
    /// 1. Session exists (`NotFound`)
    /// 2. No earlier decision (`Conflict`)
    /// 3. Session is the zone's newest and the zone waits for verification
    ///    (`InvalidState`)
    /// 4. Acting role is checker (`Forbidden`)
    /// 5. Checker profile exists (`NotFound`)
    /// 6. Checker audits the zone's branch (`Forbidden`)
    ///
    /// On approval every `Correct` scan becomes an inventory detail. The
    /// session's scans are dropped after commit either way.
    pub async fn decide(&self, request: DecideRequest) -> ServiceResult<DecideResponse> {
        let session_id = request.session_id;
        debug!(
            session_id,
            approved = request.approved,
            user_id = request.user_id,
            "decide"
        );

        validate_observations(&request.observations)?;

        let session = self.load_session(session_id).await?;
        ensure_not_already_verified(&session)?;
        ensure_pending_verification(&session)?;

        if let Err(e) = ensure_checker_role(request.role) {
            warn!(session_id, role = %request.role, "Decide rejected: role");
            return Err(e.into());
        }

        let checker = self
            .store
            .checker_by_user(request.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Checker", request.user_id))?;

        if let Err(e) = ensure_same_branch(&checker, &session) {
            warn!(
                session_id,
                checker_id = checker.id,
                "Decide rejected: checker from another branch"
            );
            return Err(e.into());
        }

        let next = session.zone.state.apply(ZoneEvent::CloseVerification)?;

        // Held until the slot is dropped so no other call sees half a decision
        let guard = self.cache.lock(session_id).await;
        let scans: Vec<ScannedItem> = match (&guard, request.approved) {
            (Some(scans), _) => scans.entries().to_vec(),
            (None, false) => Vec::new(),
            (None, true) => {
                warn!(session_id, "Approval rejected: no scan slot");
                return Err(CoreError::ScanDataLost(session_id).into());
            }
        };

        let outcome = VerificationOutcome::from_scans(
            session.zone.id,
            NewVerification {
                session_id,
                checker_id: checker.id,
                approved: request.approved,
                observations: request.observations.trim().to_string(),
                verified_at: Utc::now(),
            },
            &scans,
        );

        let verification = self
            .store
            .record_verification(&outcome, session.zone.state, next)
            .await?;

        drop(guard);
        self.cache.clear(session_id);

        info!(
            session_id,
            verification_id = verification.id,
            zone_id = session.zone.id,
            approved = verification.approved,
            details = outcome.details.len(),
            "Verification closed"
        );

        Ok(DecideResponse {
            verification_id: verification.id,
            approved: verification.approved,
            details_recorded: outcome.details.len(),
            zone_state: next,
        })
    }

    /// Snapshot of the session's scans, or `ScanDataLost` if it has none.
    async fn scans_or_lost(&self, session_id: SessionId) -> ServiceResult<Vec<ScannedItem>> {
        match self.cache.lock(session_id).await {
            Some(scans) => Ok(scans.entries().to_vec()),
            None => {
                warn!(session_id, "No scan slot for session");
                Err(CoreError::ScanDataLost(session_id).into())
            }
        }
    }
}
