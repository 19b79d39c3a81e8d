//! # Staff Repository
//!
//! Branches, users, operating groups and checker profiles. The workflow only
//! reads these; the insert methods exist for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;

use stocktake_core::{BranchId, Checker, GroupId, OperatingGroup, Role, UserId};

use crate::error::{DbError, DbResult};

/// Repository for staff and organisation tables.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Gets the checker profile attached to a user.
    pub async fn checker_by_user(&self, user_id: UserId) -> DbResult<Option<Checker>> {
        let checker = sqlx::query_as::<_, Checker>(
            r#"
            SELECT c.id, c.user_id, c.branch_id, u.name
            FROM checkers c
            JOIN users u ON u.id = c.user_id
            WHERE c.user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checker)
    }

    /// Gets an operating group by ID.
    pub async fn operating_group(&self, id: GroupId) -> DbResult<Option<OperatingGroup>> {
        let group = sqlx::query_as::<_, OperatingGroup>(
            r#"
            SELECT id, name, branch_id
            FROM operating_groups
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Gets the role stored for a user.
    pub async fn user_role(&self, user_id: UserId) -> DbResult<Option<Role>> {
        let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    // =========================================================================
    // Inserts
    // =========================================================================

    /// Inserts a branch.
    pub async fn insert_branch(&self, name: &str) -> DbResult<BranchId> {
        let result = sqlx::query("INSERT INTO branches (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts a user.
    pub async fn insert_user(
        &self,
        name: &str,
        role: Role,
        branch_id: Option<BranchId>,
    ) -> DbResult<UserId> {
        debug!(name = %name, role = %role, "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, role, branch_id)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(name)
        .bind(role)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts an operating group.
    pub async fn insert_group(&self, name: &str, branch_id: BranchId) -> DbResult<OperatingGroup> {
        let result = sqlx::query(
            r#"
            INSERT INTO operating_groups (name, branch_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(name)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        Ok(OperatingGroup {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            branch_id,
        })
    }

    /// Attaches a checker profile to an existing user.
    pub async fn insert_checker(&self, user_id: UserId, branch_id: BranchId) -> DbResult<Checker> {
        debug!(user_id, branch_id, "Inserting checker");

        sqlx::query(
            r#"
            INSERT INTO checkers (user_id, branch_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(user_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;

        // Read back through the join to pick up the user's name
        let checker = self.checker_by_user(user_id).await?;
        checker.ok_or_else(|| DbError::not_found("Checker", user_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
