//! Recover: acknowledge lost scans and restart counting from empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use stocktake_core::validation::ensure_in_progress;
use stocktake_core::SessionId;

use super::InventoryWorkflow;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecoverResponse {
    pub session_id: SessionId,
    /// False when the session still had its scans and nothing was touched.
    pub reopened: bool,
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    /// Re-opens an empty scan slot for a session being counted whose scans
    /// were lost. The operator recounts the zone from scratch.
    pub async fn recover(&self, session_id: SessionId) -> ServiceResult<RecoverResponse> {
        debug!(session_id, "recover");

        let session = self.load_session(session_id).await?;
        ensure_in_progress(&session)?;

        if self.cache.is_open(session_id) {
            return Ok(RecoverResponse {
                session_id,
                reopened: false,
            });
        }

        self.cache.open(session_id);
        warn!(
            session_id,
            zone_id = session.zone.id,
            "Scan slot re-opened after loss; zone must be recounted"
        );

        Ok(RecoverResponse {
            session_id,
            reopened: true,
        })
    }
}
