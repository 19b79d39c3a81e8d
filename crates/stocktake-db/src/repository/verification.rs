//! # Verification Repository
//!
//! Checker decisions and the inventory details written on approval.
//!
//! ## Record Transaction
//! ```text
//! BEGIN
//!   INSERT INTO verifications ...          (UNIQUE session_id: one per session)
//!   for each accepted scan:
//!     INSERT INTO inventory_details ...
//!     UPDATE items SET state_id = declared
//!   UPDATE zones SET state = available WHERE state = in_verification
//! COMMIT
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use stocktake_core::{
    InventoryDetail, SessionId, Verification, VerificationOutcome, ZoneState,
};

use crate::error::DbResult;
use crate::repository::zone::transition;

/// Repository for verification operations.
#[derive(Debug, Clone)]
pub struct VerificationRepository {
    pool: SqlitePool,
}

impl VerificationRepository {
    /// Creates a new VerificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VerificationRepository { pool }
    }

    /// Gets the verification of a session, if one was recorded.
    pub async fn get_by_session(&self, session_id: SessionId) -> DbResult<Option<Verification>> {
        let verification = sqlx::query_as::<_, Verification>(
            r#"
            SELECT id, session_id, checker_id, approved, observations, verified_at
            FROM verifications
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }

    /// Lists the inventory details recorded for a session, ordered by item.
    pub async fn details_for_session(
        &self,
        session_id: SessionId,
    ) -> DbResult<Vec<InventoryDetail>> {
        let details = sqlx::query_as::<_, InventoryDetail>(
            r#"
            SELECT id, session_id, item_id, state_id
            FROM inventory_details
            WHERE session_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Persists a checker decision in a single transaction.
    ///
    /// Details are only present in `outcome` when the count was approved;
    /// each one also overwrites the item's current state with the declared
    /// one.
    pub async fn record(
        &self,
        outcome: &VerificationOutcome,
        from: ZoneState,
        to: ZoneState,
    ) -> DbResult<Verification> {
        let new = &outcome.verification;
        debug!(
            session_id = new.session_id,
            approved = new.approved,
            details = outcome.details.len(),
            "Recording verification"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO verifications (session_id, checker_id, approved, observations, verified_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.session_id)
        .bind(new.checker_id)
        .bind(new.approved)
        .bind(&new.observations)
        .bind(new.verified_at)
        .execute(&mut *tx)
        .await?;

        let verification_id = result.last_insert_rowid();

        for detail in &outcome.details {
            sqlx::query(
                r#"
                INSERT INTO inventory_details (session_id, item_id, state_id, recorded_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(detail.session_id)
            .bind(detail.item_id)
            .bind(detail.state_id)
            .bind(new.verified_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE items SET state_id = ?2 WHERE id = ?1")
                .bind(detail.item_id)
                .bind(detail.state_id)
                .execute(&mut *tx)
                .await?;
        }

        transition(&mut tx, outcome.zone_id, from, to).await?;

        tx.commit().await?;

        info!(
            verification_id,
            session_id = new.session_id,
            approved = new.approved,
            "Verification recorded"
        );

        Ok(Verification {
            id: verification_id,
            session_id: new.session_id,
            checker_id: new.checker_id,
            approved: new.approved,
            observations: new.observations.clone(),
            verified_at: new.verified_at,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
