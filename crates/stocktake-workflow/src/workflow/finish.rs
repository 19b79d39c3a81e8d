//! Finish: close counting and hand the zone to a checker.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use stocktake_core::session::append_closing_note;
use stocktake_core::validation::{ensure_in_progress, validate_observations};
use stocktake_core::{CoreError, SessionId, ZoneEvent, ZoneState};

use super::InventoryWorkflow;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinishCountRequest {
    pub session_id: SessionId,
    /// Closing note appended to the session's observation log.
    #[serde(default)]
    pub observations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinishCountResponse {
    pub session_id: SessionId,
    pub zone_state: ZoneState,
    pub scanned_count: usize,
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    /// Ends counting: appends the closing note and moves the zone to
    /// `in_verification`. The scans stay cached for the checker.
    pub async fn finish(&self, request: FinishCountRequest) -> ServiceResult<FinishCountResponse> {
        let session_id = request.session_id;
        debug!(session_id, "finish");

        validate_observations(&request.observations)?;

        let guard = self.cache.lock(session_id).await;

        let session = self.load_session(session_id).await?;
        ensure_in_progress(&session)?;

        let Some(scans) = guard else {
            warn!(session_id, "Finish rejected: no scan slot for active session");
            return Err(CoreError::ScanDataLost(session_id).into());
        };

        let next = session.zone.state.apply(ZoneEvent::FinishCount)?;
        let log = append_closing_note(
            &session.session.observations,
            &request.observations,
            Utc::now(),
            self.settings.closing_note_header,
        );

        self.store
            .close_counting(session_id, session.zone.id, &log, session.zone.state, next)
            .await?;

        info!(
            session_id,
            zone_id = session.zone.id,
            scanned = scans.len(),
            zone_state = %next,
            "Count finished"
        );

        Ok(FinishCountResponse {
            session_id,
            zone_state: next,
            scanned_count: scans.len(),
        })
    }
}
