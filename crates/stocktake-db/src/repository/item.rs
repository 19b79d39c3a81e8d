//! # Item Repository
//!
//! Items (the physical assets being counted) and the item state catalogue.

use sqlx::SqlitePool;
use tracing::debug;

use stocktake_core::{Item, ItemId, ItemState, ItemStateId, ZoneId};

use crate::error::DbResult;

/// Repository for item and item state operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its business code (the scanned label).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, zone_id, state_id
            FROM items
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: ItemId) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, zone_id, state_id
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists every item registered to a zone, ordered by ID.
    ///
    /// This is the expected set during reconciliation.
    pub async fn list_by_zone(&self, zone_id: ZoneId) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, zone_id, state_id
            FROM items
            WHERE zone_id = ?1
            ORDER BY id
            "#,
        )
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new item.
    pub async fn insert(
        &self,
        code: &str,
        name: &str,
        zone_id: ZoneId,
        state_id: ItemStateId,
    ) -> DbResult<Item> {
        debug!(code = %code, zone_id, "Inserting item");

        let result = sqlx::query(
            r#"
            INSERT INTO items (code, name, zone_id, state_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(zone_id)
        .bind(state_id)
        .execute(&self.pool)
        .await?;

        Ok(Item {
            id: result.last_insert_rowid(),
            code: code.to_string(),
            name: name.to_string(),
            zone_id,
            state_id,
        })
    }

    // =========================================================================
    // Item States
    // =========================================================================

    /// Lists the item state catalogue, ordered by ID.
    pub async fn list_states(&self) -> DbResult<Vec<ItemState>> {
        let states = sqlx::query_as::<_, ItemState>(
            r#"
            SELECT id, label
            FROM item_states
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }

    /// Gets an item state by ID.
    pub async fn get_state(&self, id: ItemStateId) -> DbResult<Option<ItemState>> {
        let state = sqlx::query_as::<_, ItemState>(
            r#"
            SELECT id, label
            FROM item_states
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Inserts a new item state label.
    pub async fn insert_state(&self, label: &str) -> DbResult<ItemState> {
        let result = sqlx::query("INSERT INTO item_states (label) VALUES (?1)")
            .bind(label)
            .execute(&self.pool)
            .await?;

        Ok(ItemState {
            id: result.last_insert_rowid(),
            label: label.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::fixtures::seeded;

    #[tokio::test]
    async fn test_get_by_code() {
        let fx = seeded().await;
        let item = fx.db.items().get_by_code("A-002").await.unwrap().unwrap();

        assert_eq!(item.zone_id, fx.zone_a.id);
        assert_eq!(item.state_id, fx.ok_state);
        assert!(fx.db.items().get_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_zone() {
        let fx = seeded().await;
        let codes: Vec<String> = fx
            .db
            .items()
            .list_by_zone(fx.zone_a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect();

        assert_eq!(codes, vec!["A-001", "A-002"]);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let fx = seeded().await;
        let err = fx
            .db
            .items()
            .insert("A-001", "Copy", fx.zone_b.id, fx.ok_state)
            .await
            .unwrap_err();

        assert!(err.is_unique_violation_on("items.code"));
    }

    #[tokio::test]
    async fn test_unknown_zone_is_foreign_key_violation() {
        let fx = seeded().await;
        let err = fx
            .db
            .items()
            .insert("Z-001", "Orphan", 999, fx.ok_state)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_state_catalogue() {
        let fx = seeded().await;
        let labels: Vec<String> = fx
            .db
            .items()
            .list_states()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.label)
            .collect();

        assert_eq!(labels, vec!["ok", "damaged"]);
        let damaged = fx.db.items().get_state(fx.damaged_state).await.unwrap();
        assert_eq!(damaged.unwrap().label, "damaged");
    }
}
