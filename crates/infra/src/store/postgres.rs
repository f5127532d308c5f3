//! Postgres-backed ACL store.
//!
//! Implements every store seam against the three owned/consumed tables
//! (`pages`, `app_users`, `user_page_access`). Organization isolation is
//! enforced here: every query on user or override data carries `org_id` in
//! its WHERE clause.
//!
//! ## Concurrency
//!
//! The override write is a single atomic `INSERT .. ON CONFLICT .. DO
//! UPDATE` keyed on the `(user_id, page_key)` uniqueness constraint, so two
//! concurrent toggles for the same cell race at the database and the last
//! commit wins — there is no read-then-write window and no duplicate rows.
//!
//! ## Thread Safety
//!
//! `PostgresAclStore` is `Send + Sync`; all operations go through the SQLx
//! connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use nexocrm_core::{OrgId, Page, PageKey, UserId};

use super::r#trait::{
    AccessOverride, CatalogStore, IdentityStore, NewOverride, OverrideStore, StoreError,
    UserDirectory, UserRecord,
};

#[derive(Debug, Clone)]
pub struct PostgresAclStore {
    pool: Arc<PgPool>,
}

impl PostgresAclStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const USER_COLUMNS: &str = "id, external_id, org_id, name, email, role, role2, active";

const OVERRIDE_COLUMNS: &str =
    "user_id, org_id, page_key, allow, created_by, updated_by, updated_at";

#[async_trait]
impl CatalogStore for PostgresAclStore {
    async fn list_active(&self) -> Result<Vec<Page>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT key, path, label, sort_order, is_active
            FROM pages
            WHERE is_active = TRUE
            ORDER BY sort_order ASC, key ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_active_pages", e))?;

        rows.iter()
            .map(|row| {
                let page_row = PageRow::from_row(row)
                    .map_err(|e| StoreError::new("list_active_pages", e.to_string()))?;
                Ok(page_row.into())
            })
            .collect()
    }
}

#[async_trait]
impl IdentityStore for PostgresAclStore {
    async fn find_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM app_users WHERE external_id = $1 LIMIT 1"
        ))
        .bind(external_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_external_id", e))?;

        row.map(|r| user_record("find_by_external_id", &r)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM app_users WHERE lower(email) = lower($1) LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|r| user_record("find_by_email", &r)).transpose()
    }
}

#[async_trait]
impl UserDirectory for PostgresAclStore {
    async fn search_active(
        &self,
        org_id: &OrgId,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<UserRecord>, Option<i64>), StoreError> {
        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM app_users
            WHERE org_id = $1
              AND active = TRUE
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(org_id.as_str())
        .bind(search)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_active_users", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::new("count_active_users", e.to_string()))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM app_users
            WHERE org_id = $1
              AND active = TRUE
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(org_id.as_str())
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_active_users", e))?;

        let records = rows
            .iter()
            .map(|r| user_record("search_active_users", r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, Some(total)))
    }

    async fn find_in_org(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM app_users WHERE org_id = $1 AND id = $2 LIMIT 1"
        ))
        .bind(org_id.as_str())
        .bind(user_id.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_in_org", e))?;

        row.map(|r| user_record("find_user_in_org", &r)).transpose()
    }
}

#[async_trait]
impl OverrideStore for PostgresAclStore {
    async fn upsert(&self, row: NewOverride) -> Result<AccessOverride, StoreError> {
        let stored = sqlx::query(&format!(
            r#"
            INSERT INTO user_page_access (user_id, org_id, page_key, allow, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, page_key)
            DO UPDATE SET
                allow = EXCLUDED.allow,
                org_id = EXCLUDED.org_id,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {OVERRIDE_COLUMNS}
            "#
        ))
        .bind(row.user_id.as_i64())
        .bind(row.org_id.as_str())
        .bind(row.page_key.as_str())
        .bind(row.allow)
        .bind(row.actor.as_i64())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_override", e))?;

        override_record("upsert_override", &stored)
    }

    async fn for_users(
        &self,
        org_id: &OrgId,
        user_ids: &[UserId],
    ) -> Result<Vec<AccessOverride>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = user_ids.iter().map(UserId::as_i64).collect();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {OVERRIDE_COLUMNS}
            FROM user_page_access
            WHERE org_id = $1 AND user_id = ANY($2)
            "#
        ))
        .bind(org_id.as_str())
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_overrides_bulk", e))?;

        rows.iter()
            .map(|r| override_record("load_overrides_bulk", r))
            .collect()
    }

    async fn for_user(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Vec<AccessOverride>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {OVERRIDE_COLUMNS}
            FROM user_page_access
            WHERE org_id = $1 AND user_id = $2
            "#
        ))
        .bind(org_id.as_str())
        .bind(user_id.as_i64())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_overrides", e))?;

        rows.iter()
            .map(|r| override_record("load_overrides", r))
            .collect()
    }
}

// Row mapping

#[derive(Debug)]
struct PageRow {
    key: String,
    path: String,
    label: String,
    sort_order: i32,
    is_active: bool,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for PageRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PageRow {
            key: row.try_get("key")?,
            path: row.try_get("path")?,
            label: row.try_get("label")?,
            sort_order: row.try_get("sort_order")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Page {
            key: PageKey::new(row.key),
            path: row.path,
            label: row.label,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

fn user_record(
    operation: &'static str,
    row: &sqlx::postgres::PgRow,
) -> Result<UserRecord, StoreError> {
    let raw_id: i64 = row
        .try_get("id")
        .map_err(|e| StoreError::new(operation, e.to_string()))?;
    let id = UserId::new(raw_id)
        .ok_or_else(|| StoreError::new(operation, format!("invalid user id {raw_id}")))?;

    let get = |column: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(column)
            .map_err(|e| StoreError::new(operation, e.to_string()))
    };

    Ok(UserRecord {
        id,
        external_id: row
            .try_get::<Option<Uuid>, _>("external_id")
            .map_err(|e| StoreError::new(operation, e.to_string()))?,
        org_id: OrgId::new(get("org_id")?),
        name: get("name")?,
        email: get("email")?,
        role: get("role")?,
        secondary_role: get("role2")?,
        active: row
            .try_get("active")
            .map_err(|e| StoreError::new(operation, e.to_string()))?,
    })
}

fn override_record(
    operation: &'static str,
    row: &sqlx::postgres::PgRow,
) -> Result<AccessOverride, StoreError> {
    let err = |e: sqlx::Error| StoreError::new(operation, e.to_string());

    let user_id: i64 = row.try_get("user_id").map_err(err)?;
    let created_by: i64 = row.try_get("created_by").map_err(err)?;
    let updated_by: i64 = row.try_get("updated_by").map_err(err)?;

    let as_user_id = |raw: i64| {
        UserId::new(raw).ok_or_else(|| StoreError::new(operation, format!("invalid user id {raw}")))
    };

    Ok(AccessOverride {
        user_id: as_user_id(user_id)?,
        org_id: OrgId::new(
            row.try_get::<String, _>("org_id")
                .map_err(err)?,
        ),
        page_key: PageKey::new(row.try_get::<String, _>("page_key").map_err(err)?),
        allow: row.try_get("allow").map_err(err)?,
        created_by: as_user_id(created_by)?,
        updated_by: as_user_id(updated_by)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(err)?,
    })
}

/// Map SQLx errors to `StoreError`, preserving SQLSTATE context.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err
                .code()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| "unknown".to_string());
            StoreError::new(
                operation,
                format!("database error (sqlstate {code}): {}", db_err.message()),
            )
        }
        sqlx::Error::PoolClosed => StoreError::new(operation, "connection pool closed"),
        sqlx::Error::RowNotFound => StoreError::new(operation, "unexpected row not found"),
        other => StoreError::new(operation, other.to_string()),
    }
}
