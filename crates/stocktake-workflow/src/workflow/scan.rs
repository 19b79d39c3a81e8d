//! Scan: record one item against an in-progress session.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use stocktake_core::validation::{
    classify_zone, ensure_in_progress, ensure_item_exists, ensure_not_duplicate,
    validate_item_code,
};
use stocktake_core::{
    CoreError, ItemId, ItemStateId, ScanClassification, ScannedItem, SessionId,
};

use super::InventoryWorkflow;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanItemRequest {
    pub session_id: SessionId,
    /// Code printed on the item's label.
    pub item_code: String,
    /// Condition the operator observed.
    pub state_id: ItemStateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanItemResponse {
    /// True when the item belongs to the zone being counted.
    pub valid: bool,
    pub classification: ScanClassification,
    pub message: String,
    pub item_id: ItemId,
}

impl<S: InventoryStore> InventoryWorkflow<S> {
    /// Records a scan in the session's cache.
    ///
    /// ## Checks (in order)
    /// 1. Session exists (`NotFound`)
    /// 2. Session is the zone's live count and the zone is being counted
    ///    (`InvalidState`)
    /// 3. Session still has its scans (`ScanDataLost`)
    /// 4. Item code resolves (`NotFound`)
    /// 5. Declared state exists (`NotFound`)
    /// 6. Item not scanned yet (`Conflict`)
    ///
    /// The session lock is taken first and held to the end, so a Finish
    /// cannot slip in between the zone check and the insert.
    pub async fn scan(&self, request: ScanItemRequest) -> ServiceResult<ScanItemResponse> {
        let session_id = request.session_id;
        debug!(session_id, item_code = %request.item_code, "scan");

        let code = validate_item_code(&request.item_code)?;

        let guard = self.cache.lock(session_id).await;

        let session = self.load_session(session_id).await?;
        ensure_in_progress(&session)?;

        let Some(mut scans) = guard else {
            warn!(session_id, "Scan rejected: no scan slot for active session");
            return Err(CoreError::ScanDataLost(session_id).into());
        };

        let item = ensure_item_exists(self.store.item_by_code(&code).await?, &code)?;

        self.store
            .item_state(request.state_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Item state", request.state_id))?;

        ensure_not_duplicate(session_id, &item, &*scans)?;

        let classification = classify_zone(&item, &session.zone);
        scans.insert_if_absent(ScannedItem {
            item_id: item.id,
            item_code: item.code.clone(),
            item_name: item.name.clone(),
            state_id: request.state_id,
            classification,
            scanned_at: Utc::now(),
        });

        let message = match classification {
            ScanClassification::Correct => {
                format!("{} ({}) recorded in {}", item.name, item.code, session.zone.name)
            }
            ScanClassification::WrongZone => format!(
                "{} ({}) is registered to zone {}, not {}",
                item.name, item.code, item.zone_id, session.zone.name
            ),
        };

        debug!(
            session_id,
            item_id = item.id,
            classification = %classification,
            scanned = scans.len(),
            "Scan recorded"
        );

        Ok(ScanItemResponse {
            valid: classification.is_correct(),
            classification,
            message,
            item_id: item.id,
        })
    }
}
