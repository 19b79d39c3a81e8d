//! # Zone Repository
//!
//! Zones and their state column.
//!
//! ## State Writes
//! ```text
//! UPDATE zones SET state = :to WHERE id = :zone AND state = :from
//!        │
//!        ├── 1 row  → transition applied
//!        └── 0 rows → someone else moved the zone first → StaleState
//! ```
//! The state column is only ever written through [`transition`], inside the
//! transaction of the operation that owns the change.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stocktake_core::{BranchId, UserId, Zone, ZoneId, ZoneState};

use crate::error::{DbError, DbResult};

/// Repository for zone database operations.
#[derive(Debug, Clone)]
pub struct ZoneRepository {
    pool: SqlitePool,
}

impl ZoneRepository {
    /// Creates a new ZoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ZoneRepository { pool }
    }

    /// Gets a zone by ID.
    pub async fn get_by_id(&self, id: ZoneId) -> DbResult<Option<Zone>> {
        let zone = sqlx::query_as::<_, Zone>(
            r#"
            SELECT id, name, branch_id, area_manager_id, state
            FROM zones
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(zone)
    }

    /// Counts all zones.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM zones")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new zone in the `available` state.
    pub async fn insert(
        &self,
        name: &str,
        branch_id: BranchId,
        area_manager_id: UserId,
    ) -> DbResult<Zone> {
        debug!(name = %name, branch_id, "Inserting zone");

        let result = sqlx::query(
            r#"
            INSERT INTO zones (name, branch_id, area_manager_id, state)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(name)
        .bind(branch_id)
        .bind(area_manager_id)
        .bind(ZoneState::Available)
        .execute(&self.pool)
        .await?;

        Ok(Zone {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            branch_id,
            area_manager_id,
            state: ZoneState::Available,
        })
    }
}

/// Moves a zone from `from` to `to` on the given connection.
///
/// Meant to be called with `&mut *tx` so the state change commits or rolls
/// back together with the rows of the same operation.
pub(crate) async fn transition(
    conn: &mut SqliteConnection,
    zone_id: ZoneId,
    from: ZoneState,
    to: ZoneState,
) -> DbResult<()> {
    debug!(zone_id, from = %from, to = %to, "Transitioning zone");

    let result = sqlx::query(
        r#"
        UPDATE zones
        SET state = ?3
        WHERE id = ?1 AND state = ?2
        "#,
    )
    .bind(zone_id)
    .bind(from)
    .bind(to)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::stale("Zone", zone_id, from));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::seeded;

    #[tokio::test]
    async fn test_new_zone_is_available() {
        let fx = seeded().await;
        let zone = fx.db.zones().get_by_id(fx.zone_a.id).await.unwrap().unwrap();

        assert_eq!(zone.state, ZoneState::Available);
        assert_eq!(zone.area_manager_id, fx.manager_id);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let fx = seeded().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();

        transition(&mut conn, fx.zone_a.id, ZoneState::Available, ZoneState::InInventory)
            .await
            .unwrap();

        let second = transition(
            &mut conn,
            fx.zone_a.id,
            ZoneState::Available,
            ZoneState::InInventory,
        )
        .await;
        assert!(matches!(second, Err(DbError::StaleState { .. })));

        drop(conn);
        let zone = fx.db.zones().get_by_id(fx.zone_a.id).await.unwrap().unwrap();
        assert_eq!(zone.state, ZoneState::InInventory);
    }

    #[tokio::test]
    async fn test_missing_zone() {
        let fx = seeded().await;
        assert!(fx.db.zones().get_by_id(424242).await.unwrap().is_none());
    }
}
