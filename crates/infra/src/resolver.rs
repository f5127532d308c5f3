//! Identity resolution for the current request.
//!
//! Resolution backs navigation, a read-heavy and availability-sensitive
//! path, so this wrapper never fails: lookup errors and unusable rows both
//! resolve to `None`, which callers must treat as unauthenticated — not as
//! an error to retry.

use std::sync::Arc;

use nexocrm_auth::{Principal, UserIdentity};

use crate::store::{IdentityStore, StoreError, UserRecord};

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolve the internal application user for a session principal.
    pub async fn resolve(&self, principal: &Principal) -> Option<UserIdentity> {
        let record = match self.lookup(principal).await {
            Ok(found) => found?,
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed; treating as unauthenticated");
                return None;
            }
        };

        let identity = record.identity();
        if identity.org_id.is_empty() {
            tracing::warn!(user_id = %identity.id, "user row has no organization; treating as unauthenticated");
            return None;
        }
        Some(identity)
    }

    async fn lookup(&self, principal: &Principal) -> Result<Option<UserRecord>, StoreError> {
        if let Some(record) = self.store.find_by_external_id(principal.external_id).await? {
            return Ok(Some(record));
        }
        // Accounts linked before external ids existed are matched by email.
        self.store.find_by_email(&principal.email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAclStore;
    use nexocrm_core::{OrgId, UserId};
    use uuid::Uuid;

    fn record(id: i64, external_id: Option<Uuid>, email: &str, org: &str) -> UserRecord {
        UserRecord {
            id: UserId::new(id).unwrap(),
            external_id,
            org_id: OrgId::new(org),
            name: format!("User {id}"),
            email: email.to_string(),
            role: "Representante".to_string(),
            secondary_role: String::new(),
            active: true,
        }
    }

    fn principal(external_id: Uuid, email: &str) -> Principal {
        Principal {
            external_id,
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn resolves_by_external_id() {
        let external = Uuid::now_v7();
        let store = Arc::new(InMemoryAclStore::new());
        store.add_user(record(7, Some(external), "ana@example.com", "org-1"));

        let resolver = IdentityResolver::new(store);
        let identity = resolver
            .resolve(&principal(external, "ana@example.com"))
            .await
            .unwrap();
        assert_eq!(identity.id.as_i64(), 7);
    }

    #[tokio::test]
    async fn falls_back_to_email_for_historical_accounts() {
        let store = Arc::new(InMemoryAclStore::new());
        store.add_user(record(9, None, "bia@example.com", "org-1"));

        let resolver = IdentityResolver::new(store);
        let identity = resolver
            .resolve(&principal(Uuid::now_v7(), "Bia@Example.com"))
            .await
            .unwrap();
        assert_eq!(identity.id.as_i64(), 9);
    }

    #[tokio::test]
    async fn absorbs_store_failures_as_unauthenticated() {
        let store = Arc::new(InMemoryAclStore::new());
        store.add_user(record(7, None, "ana@example.com", "org-1"));
        store.set_failing(true);

        let resolver = IdentityResolver::new(store);
        assert!(resolver
            .resolve(&principal(Uuid::now_v7(), "ana@example.com"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn rejects_rows_without_an_organization() {
        let external = Uuid::now_v7();
        let store = Arc::new(InMemoryAclStore::new());
        store.add_user(record(7, Some(external), "ana@example.com", ""));

        let resolver = IdentityResolver::new(store);
        assert!(resolver
            .resolve(&principal(external, "ana@example.com"))
            .await
            .is_none());
    }
}
