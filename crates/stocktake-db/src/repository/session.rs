//! # Session Repository
//!
//! Inventory sessions, read together with their zone.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open() → INSERT session + zone available → in_inventory        │
//! │                                                                         │
//! │  2. CLOSE COUNTING                                                     │
//! │     └── close_counting() → UPDATE observations                         │
//! │                           + zone in_inventory → in_verification        │
//! │                                                                         │
//! │  3. VERIFY (VerificationRepository::record)                            │
//! │     └── INSERT verification (+ details) + zone → available             │
//! │                                                                         │
//! │  Each step is one transaction. The zone update is a compare-and-set,   │
//! │  so a step either fully happens or leaves no trace.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use stocktake_core::{
    BranchId, GroupId, NewSession, Session, SessionId, SessionWithZone, UserId, VerificationId,
    Zone, ZoneId, ZoneState,
};

use crate::error::{DbError, DbResult};
use crate::repository::zone::transition;

/// Flat row of the session ⋈ zone ⟕ verification join, plus the zone's
/// newest session id.
#[derive(Debug, sqlx::FromRow)]
struct SessionZoneRow {
    session_id: SessionId,
    zone_id: ZoneId,
    group_id: GroupId,
    started_by: UserId,
    started_at: DateTime<Utc>,
    observations: String,
    zone_name: String,
    branch_id: BranchId,
    area_manager_id: UserId,
    zone_state: ZoneState,
    verification_id: Option<VerificationId>,
    current_session_id: SessionId,
}

impl From<SessionZoneRow> for SessionWithZone {
    fn from(row: SessionZoneRow) -> Self {
        SessionWithZone {
            session: Session {
                id: row.session_id,
                zone_id: row.zone_id,
                group_id: row.group_id,
                started_by: row.started_by,
                started_at: row.started_at,
                observations: row.observations,
            },
            zone: Zone {
                id: row.zone_id,
                name: row.zone_name,
                branch_id: row.branch_id,
                area_manager_id: row.area_manager_id,
                state: row.zone_state,
            },
            verification_id: row.verification_id,
            current_session_id: row.current_session_id,
        }
    }
}

const SESSION_WITH_ZONE_SELECT: &str = r#"
    SELECT
        s.id            AS session_id,
        s.zone_id       AS zone_id,
        s.group_id      AS group_id,
        s.started_by    AS started_by,
        s.started_at    AS started_at,
        s.observations  AS observations,
        z.name          AS zone_name,
        z.branch_id     AS branch_id,
        z.area_manager_id AS area_manager_id,
        z.state         AS zone_state,
        v.id            AS verification_id,
        (SELECT MAX(c.id) FROM inventory_sessions c WHERE c.zone_id = s.zone_id)
                        AS current_session_id
    FROM inventory_sessions s
    JOIN zones z ON z.id = s.zone_id
    LEFT JOIN verifications v ON v.session_id = s.id
"#;

/// Repository for inventory session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session together with its zone and verification marker.
    pub async fn get_with_zone(&self, id: SessionId) -> DbResult<Option<SessionWithZone>> {
        let sql = format!("{SESSION_WITH_ZONE_SELECT} WHERE s.id = ?1");

        let row = sqlx::query_as::<_, SessionZoneRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SessionWithZone::from))
    }

    /// Lists every session of every zone in a branch, newest first.
    pub async fn list_by_branch(&self, branch_id: BranchId) -> DbResult<Vec<SessionWithZone>> {
        let sql = format!(
            "{SESSION_WITH_ZONE_SELECT} WHERE z.branch_id = ?1 ORDER BY s.started_at DESC, s.id DESC"
        );

        let rows = sqlx::query_as::<_, SessionZoneRow>(&sql)
            .bind(branch_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SessionWithZone::from).collect())
    }

    /// Creates a session and moves its zone from `from` to `to`.
    ///
    /// ## Transaction
    /// ```text
    /// BEGIN
    ///   UPDATE zones SET state = to WHERE id = ? AND state = from   (must hit 1 row)
    ///   INSERT INTO inventory_sessions ...
    /// COMMIT
    /// ```
    pub async fn open(
        &self,
        new: &NewSession,
        from: ZoneState,
        to: ZoneState,
    ) -> DbResult<Session> {
        debug!(zone_id = new.zone_id, group_id = new.group_id, "Opening session");

        let mut tx = self.pool.begin().await?;

        transition(&mut tx, new.zone_id, from, to).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_sessions (zone_id, group_id, started_by, started_at, observations)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.zone_id)
        .bind(new.group_id)
        .bind(new.started_by)
        .bind(new.started_at)
        .bind(&new.observations)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Session {
            id: result.last_insert_rowid(),
            zone_id: new.zone_id,
            group_id: new.group_id,
            started_by: new.started_by,
            started_at: new.started_at,
            observations: new.observations.clone(),
        })
    }

    /// Stores the final observation log and moves the zone from `from` to `to`.
    pub async fn close_counting(
        &self,
        session_id: SessionId,
        zone_id: ZoneId,
        observations: &str,
        from: ZoneState,
        to: ZoneState,
    ) -> DbResult<()> {
        debug!(session_id, zone_id, "Closing count");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE inventory_sessions
            SET observations = ?3
            WHERE id = ?1 AND zone_id = ?2
            "#,
        )
        .bind(session_id)
        .bind(zone_id)
        .bind(observations)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session", session_id));
        }

        transition(&mut tx, zone_id, from, to).await?;

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
