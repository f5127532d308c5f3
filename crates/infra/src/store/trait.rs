use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use nexocrm_auth::{Role, UserIdentity};
use nexocrm_core::{OrgId, Page, PageKey, UserId};

/// Store-level failure.
///
/// Carries the failing operation and the underlying message; services map
/// this to the `Upstream` variant of the engine taxonomy (or absorb it,
/// for the availability-sensitive read paths).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("store error in {operation}: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Raw user row as stored by the user-management system.
///
/// Read-only to this engine; role fields are the historical free-text
/// columns (`role`, `role2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub external_id: Option<Uuid>,
    pub org_id: OrgId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub secondary_role: String,
    pub active: bool,
}

impl UserRecord {
    /// Typed identity view of this row.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            org_id: self.org_id.clone(),
            role: Role::parse(&self.role),
            secondary_role: Role::parse(&self.secondary_role),
            active: self.active,
        }
    }
}

/// Stored per-(user, page) allow/deny override.
///
/// Unique on `(user_id, page_key)`; never deleted — "revoke" is
/// `allow = false`, superseded only by a later upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessOverride {
    pub user_id: UserId,
    pub org_id: OrgId,
    pub page_key: PageKey,
    pub allow: bool,
    pub created_by: UserId,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input for one override row.
#[derive(Debug, Clone)]
pub struct NewOverride {
    pub user_id: UserId,
    pub org_id: OrgId,
    pub page_key: PageKey,
    pub allow: bool,
    /// Manager performing the toggle; stamped as created_by/updated_by.
    pub actor: UserId,
}

/// Read side of the page catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active pages ordered by `sort_order` then `key`.
    async fn list_active(&self) -> Result<Vec<Page>, StoreError>;
}

/// Lookups backing identity resolution.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// Organization-scoped user queries for the manager grid.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// One page of active users in an organization, filtered by a
    /// case-insensitive substring match on name or email, ordered by name.
    ///
    /// The second element is the exact total when the store can count;
    /// `None` makes the caller fall back to the
    /// `returned == page_size` heuristic for `has_next_page`.
    async fn search_active(
        &self,
        org_id: &OrgId,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<UserRecord>, Option<i64>), StoreError>;

    /// One user by id, visible only within the given organization.
    async fn find_in_org(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Option<UserRecord>, StoreError>;
}

/// Persistence for per-(user, page) overrides.
///
/// Every query carries the organization id in its predicate: cross-
/// organization reads and writes are impossible at this layer, not merely
/// filtered in the UI.
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Atomic insert-or-update keyed on the `(user_id, page_key)`
    /// uniqueness constraint. Never decomposed into check-then-write.
    async fn upsert(&self, row: NewOverride) -> Result<AccessOverride, StoreError>;

    /// Bulk-load overrides for a set of users in one query (no N+1).
    async fn for_users(
        &self,
        org_id: &OrgId,
        user_ids: &[UserId],
    ) -> Result<Vec<AccessOverride>, StoreError>;

    /// Overrides for a single user.
    async fn for_user(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Vec<AccessOverride>, StoreError>;
}
