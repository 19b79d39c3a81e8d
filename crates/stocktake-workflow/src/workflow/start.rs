//! Start: open a session on an idle zone.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use stocktake_core::validation::{ensure_zone_available, validate_id, validate_observations};
use stocktake_core::{
    CoreError, GroupId, NewSession, SessionId, UserId, ZoneEvent, ZoneId, ZoneState,
};

use super::InventoryWorkflow;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StartCountRequest {
    pub zone_id: ZoneId,
    pub group_id: GroupId,
    #[serde(default)]
    pub observations: Option<String>,
    /// Acting user, as resolved by the auth layer.
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StartCountResponse {
    pub session_id: SessionId,
    pub zone_id: ZoneId,
    pub zone_state: ZoneState,
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    /// Opens a new counting session on an available zone.
    ///
    /// The only way a session comes into existence. The session row and the
    /// zone move commit together; a concurrent Start on the same zone loses
    /// the compare-and-set and fails with `InvalidState`.
    pub async fn start(&self, request: StartCountRequest) -> ServiceResult<StartCountResponse> {
        debug!(
            zone_id = request.zone_id,
            group_id = request.group_id,
            user_id = request.user_id,
            "start"
        );

        validate_id("zone_id", request.zone_id)?;
        validate_id("group_id", request.group_id)?;
        let observations = request.observations.unwrap_or_default();
        validate_observations(&observations)?;

        let zone = self
            .store
            .zone(request.zone_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Zone", request.zone_id))?;
        ensure_zone_available(&zone)?;

        self.store
            .operating_group(request.group_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Operating group", request.group_id))?;

        let next = zone.state.apply(ZoneEvent::StartCount)?;

        let new = NewSession {
            zone_id: zone.id,
            group_id: request.group_id,
            started_by: request.user_id,
            started_at: Utc::now(),
            observations,
        };
        let session = self.store.open_session(&new, zone.state, next).await?;

        self.cache.open(session.id);

        info!(
            session_id = session.id,
            zone_id = zone.id,
            zone_state = %next,
            "Count started"
        );

        Ok(StartCountResponse {
            session_id: session.id,
            zone_id: zone.id,
            zone_state: next,
        })
    }
}
