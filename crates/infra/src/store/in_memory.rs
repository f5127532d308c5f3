//! In-memory ACL store.
//!
//! Intended for tests/dev. Not optimized for performance. A failure flag
//! lets tests exercise the degrade-to-default and upstream-error paths.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use nexocrm_core::{OrgId, Page, UserId};

use super::r#trait::{
    AccessOverride, CatalogStore, IdentityStore, NewOverride, OverrideStore, StoreError,
    UserDirectory, UserRecord,
};

#[derive(Debug, Default)]
pub struct InMemoryAclStore {
    pages: RwLock<Vec<Page>>,
    users: RwLock<Vec<UserRecord>>,
    overrides: RwLock<HashMap<(UserId, String), AccessOverride>>,
    failing: RwLock<bool>,
}

impl InMemoryAclStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_pages(&self, pages: Vec<Page>) {
        *self.pages.write().expect("lock poisoned") = pages;
    }

    pub fn add_user(&self, user: UserRecord) {
        self.users.write().expect("lock poisoned").push(user);
    }

    /// Make every operation fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write().expect("lock poisoned") = failing;
    }

    /// Number of stored override rows (for idempotence assertions).
    pub fn override_count(&self) -> usize {
        self.overrides.read().expect("lock poisoned").len()
    }

    fn check_available(&self, operation: &'static str) -> Result<(), StoreError> {
        if *self.failing.read().expect("lock poisoned") {
            Err(StoreError::new(operation, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryAclStore {
    async fn list_active(&self) -> Result<Vec<Page>, StoreError> {
        self.check_available("list_active_pages")?;

        let mut pages: Vec<Page> = self
            .pages
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        pages.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.key.as_str().cmp(b.key.as_str()))
        });
        Ok(pages)
    }
}

#[async_trait]
impl IdentityStore for InMemoryAclStore {
    async fn find_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.check_available("find_by_external_id")?;

        Ok(self
            .users
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|u| u.external_id == Some(external_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check_available("find_by_email")?;

        Ok(self
            .users
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryAclStore {
    async fn search_active(
        &self,
        org_id: &OrgId,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<UserRecord>, Option<i64>), StoreError> {
        self.check_available("search_active_users")?;

        let needle = search.map(str::to_lowercase);
        let mut matches: Vec<UserRecord> = self
            .users
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|u| &u.org_id == org_id && u.active)
            .filter(|u| match &needle {
                Some(n) => {
                    u.name.to_lowercase().contains(n) || u.email.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let total = matches.len() as i64;
        let page: Vec<UserRecord> = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, Some(total)))
    }

    async fn find_in_org(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.check_available("find_user_in_org")?;

        Ok(self
            .users
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|u| &u.org_id == org_id && u.id == user_id)
            .cloned())
    }
}

#[async_trait]
impl OverrideStore for InMemoryAclStore {
    async fn upsert(&self, row: NewOverride) -> Result<AccessOverride, StoreError> {
        self.check_available("upsert_override")?;

        let key = (row.user_id, row.page_key.as_str().to_string());
        let mut overrides = self.overrides.write().expect("lock poisoned");

        let created_by = overrides
            .get(&key)
            .map(|existing| existing.created_by)
            .unwrap_or(row.actor);

        let stored = AccessOverride {
            user_id: row.user_id,
            org_id: row.org_id,
            page_key: row.page_key,
            allow: row.allow,
            created_by,
            updated_by: row.actor,
            updated_at: Utc::now(),
        };
        overrides.insert(key, stored.clone());
        Ok(stored)
    }

    async fn for_users(
        &self,
        org_id: &OrgId,
        user_ids: &[UserId],
    ) -> Result<Vec<AccessOverride>, StoreError> {
        self.check_available("load_overrides_bulk")?;

        Ok(self
            .overrides
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|o| &o.org_id == org_id && user_ids.contains(&o.user_id))
            .cloned()
            .collect())
    }

    async fn for_user(
        &self,
        org_id: &OrgId,
        user_id: UserId,
    ) -> Result<Vec<AccessOverride>, StoreError> {
        self.check_available("load_overrides")?;

        Ok(self
            .overrides
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|o| &o.org_id == org_id && o.user_id == user_id)
            .cloned()
            .collect())
    }
}
