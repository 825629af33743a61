//! Admin repository: admins, their role/permission links, and the grant
//! reference tables.
//!
//! Admin writes and the link diff that follows them share one transaction, so
//! an admin is never visible with a half-applied set of grants.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use backoffice_core::{AdminId, PermissionId, RoleId};

use super::{PgStore, RepositoryError, conflict_on_unique, contains_pattern, limit_offset, row_count};
use crate::models::{
    Admin, AdminChanges, AdminLinks, LinkDiff, NewAdmin, Page, PageRequest, Permission, Role,
};

/// Data access for admins and their grants.
pub trait AdminRepository: Send + Sync {
    /// Page of admins ordered by ID, optionally filtered by a keyword matched
    /// against login identifier and display name.
    fn list_admins(
        &self,
        page: PageRequest,
        keyword: Option<&str>,
    ) -> impl Future<Output = Result<Page<Admin>, RepositoryError>> + Send;

    fn find_admin(
        &self,
        id: AdminId,
    ) -> impl Future<Output = Result<Option<Admin>, RepositoryError>> + Send;

    fn find_admin_by_user_id(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Admin>, RepositoryError>> + Send;

    /// Whether an admin other than `exclude` already uses `user_id`.
    fn admin_user_id_taken(
        &self,
        user_id: &str,
        exclude: Option<AdminId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert an admin and its links.
    ///
    /// Returns `RepositoryError::Conflict("userId")` on a duplicate login.
    fn insert_admin(
        &self,
        admin: NewAdmin,
        links: &AdminLinks,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;

    /// Replace an admin's mutable fields and links.
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    fn update_admin(
        &self,
        id: AdminId,
        changes: AdminChanges,
        links: &AdminLinks,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;

    /// Hard-delete an admin (links cascade) and return the removed row.
    fn delete_admin(
        &self,
        id: AdminId,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;

    fn admin_links(
        &self,
        id: AdminId,
    ) -> impl Future<Output = Result<AdminLinks, RepositoryError>> + Send;

    /// Make the admin's links exactly `links`.
    fn replace_admin_links(
        &self,
        id: AdminId,
        links: &AdminLinks,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn list_roles(&self) -> impl Future<Output = Result<Vec<Role>, RepositoryError>> + Send;

    fn list_permissions(
        &self,
    ) -> impl Future<Output = Result<Vec<Permission>, RepositoryError>> + Send;

    fn roles_of(&self, id: AdminId)
    -> impl Future<Output = Result<Vec<Role>, RepositoryError>> + Send;

    fn permissions_of(
        &self,
        id: AdminId,
    ) -> impl Future<Output = Result<Vec<Permission>, RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: AdminId,
    user_id: String,
    user_name: String,
    password_hash: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            password_hash: row.password_hash,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    id: i32,
    name: String,
}

const ADMIN_COLUMNS: &str =
    "id, user_id, user_name, password_hash, avatar, created_at, updated_at";

// =============================================================================
// Link Helpers
// =============================================================================

async fn current_links(conn: &mut PgConnection, id: AdminId) -> Result<AdminLinks, RepositoryError> {
    let roles: Vec<RoleId> =
        sqlx::query_scalar("SELECT role_id FROM role_admin WHERE admin_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let permissions: Vec<PermissionId> = sqlx::query_scalar(
        "SELECT permission_id FROM admin_permission WHERE admin_id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(AdminLinks::new(roles, permissions))
}

/// Apply one side of a link diff to a join table.
async fn apply_diff<T>(
    conn: &mut PgConnection,
    table: &'static str,
    column: &'static str,
    admin: AdminId,
    diff: &LinkDiff<T>,
) -> Result<(), RepositoryError>
where
    T: Copy + Into<i32>,
{
    if !diff.removed.is_empty() {
        let removed: Vec<i32> = diff.removed.iter().map(|&id| id.into()).collect();
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE admin_id = $1 AND {column} = ANY($2)"
        ))
        .bind(admin)
        .bind(removed)
        .execute(&mut *conn)
        .await?;
    }

    if !diff.added.is_empty() {
        let mut insert: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {table} (admin_id, {column}) "));
        insert.push_values(diff.added.iter(), |mut row, &id| {
            row.push_bind(admin).push_bind(id.into());
        });
        insert.build().execute(&mut *conn).await?;
    }

    Ok(())
}

async fn write_links(
    conn: &mut PgConnection,
    id: AdminId,
    links: &AdminLinks,
) -> Result<(), RepositoryError> {
    let existing = current_links(conn, id).await?;
    let (roles, permissions) = existing.diff_to(links);
    apply_diff(conn, "role_admin", "role_id", id, &roles).await?;
    apply_diff(conn, "admin_permission", "permission_id", id, &permissions).await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

impl AdminRepository for PgStore {
    async fn list_admins(
        &self,
        page: PageRequest,
        keyword: Option<&str>,
    ) -> Result<Page<Admin>, RepositoryError> {
        let pattern = keyword.filter(|k| !k.is_empty()).map(contains_pattern);
        let (limit, offset) = limit_offset(page);

        let rows: Vec<AdminRow> = sqlx::query_as(&format!(
            r"
            SELECT {ADMIN_COLUMNS}
            FROM admins
            WHERE $1::text IS NULL OR user_id ILIKE $1 OR user_name ILIKE $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM admins
            WHERE $1::text IS NULL OR user_id ILIKE $1 OR user_name ILIKE $1
            ",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool())
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Admin::from).collect(),
            row_count(total),
            page,
        ))
    }

    async fn find_admin(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        let row: Option<AdminRow> =
            sqlx::query_as(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.map(Admin::from))
    }

    async fn find_admin_by_user_id(&self, user_id: &str) -> Result<Option<Admin>, RepositoryError> {
        let row: Option<AdminRow> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Admin::from))
    }

    async fn admin_user_id_taken(
        &self,
        user_id: &str,
        exclude: Option<AdminId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM admins
                WHERE user_id = $1 AND ($2::integer IS NULL OR id <> $2)
            )
            ",
        )
        .bind(user_id)
        .bind(exclude)
        .fetch_one(self.pool())
        .await?;

        Ok(taken)
    }

    async fn insert_admin(
        &self,
        admin: NewAdmin,
        links: &AdminLinks,
    ) -> Result<Admin, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row: AdminRow = sqlx::query_as(&format!(
            r"
            INSERT INTO admins (user_id, user_name, password_hash, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(&admin.user_id)
        .bind(&admin.user_name)
        .bind(&admin.password_hash)
        .bind(&admin.avatar)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique("userId"))?;

        write_links(&mut tx, row.id, links).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn update_admin(
        &self,
        id: AdminId,
        changes: AdminChanges,
        links: &AdminLinks,
    ) -> Result<Admin, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row: AdminRow = sqlx::query_as(&format!(
            r"
            UPDATE admins
            SET user_id = $1,
                user_name = $2,
                avatar = $3,
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(&changes.user_id)
        .bind(&changes.user_name)
        .bind(&changes.avatar)
        .bind(&changes.password_hash)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(conflict_on_unique("userId"))?
        .ok_or(RepositoryError::NotFound)?;

        write_links(&mut tx, id, links).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn delete_admin(&self, id: AdminId) -> Result<Admin, RepositoryError> {
        let row: AdminRow = sqlx::query_as(&format!(
            "DELETE FROM admins WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn admin_links(&self, id: AdminId) -> Result<AdminLinks, RepositoryError> {
        let roles: Vec<RoleId> =
            sqlx::query_scalar("SELECT role_id FROM role_admin WHERE admin_id = $1")
                .bind(id)
                .fetch_all(self.pool())
                .await?;

        let permissions: Vec<PermissionId> =
            sqlx::query_scalar("SELECT permission_id FROM admin_permission WHERE admin_id = $1")
                .bind(id)
                .fetch_all(self.pool())
                .await?;

        Ok(AdminLinks::new(roles, permissions))
    }

    async fn replace_admin_links(
        &self,
        id: AdminId,
        links: &AdminLinks,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Lock the admin row so a concurrent delete cannot interleave.
        let exists: Option<AdminId> =
            sqlx::query_scalar("SELECT id FROM admins WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        write_links(&mut tx, id, links).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        let rows: Vec<GrantRow> = sqlx::query_as("SELECT id, name FROM roles ORDER BY id ASC")
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Role {
                id: RoleId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        let rows: Vec<GrantRow> =
            sqlx::query_as("SELECT id, name FROM permissions ORDER BY id ASC")
                .fetch_all(self.pool())
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| Permission {
                id: PermissionId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn roles_of(&self, id: AdminId) -> Result<Vec<Role>, RepositoryError> {
        let rows: Vec<GrantRow> = sqlx::query_as(
            r"
            SELECT r.id, r.name
            FROM roles r
            JOIN role_admin ra ON ra.role_id = r.id
            WHERE ra.admin_id = $1
            ORDER BY r.id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Role {
                id: RoleId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn permissions_of(&self, id: AdminId) -> Result<Vec<Permission>, RepositoryError> {
        let rows: Vec<GrantRow> = sqlx::query_as(
            r"
            SELECT p.id, p.name
            FROM permissions p
            JOIN admin_permission ap ON ap.permission_id = p.id
            WHERE ap.admin_id = $1
            ORDER BY p.id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Permission {
                id: PermissionId::new(r.id),
                name: r.name,
            })
            .collect())
    }
}
