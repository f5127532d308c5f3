//! ACL services: the matrix read path, the toggle write path, and the
//! navigation path guard.
//!
//! The availability policy differs per path and is deliberate:
//! - navigation (`allowed_paths`, `is_path_allowed`) never hard-fails on
//!   subsystem errors;
//! - the manager-facing matrix/toggle operations surface precise errors
//!   instead of absorbing them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use nexocrm_auth::{effective_access, UserIdentity};
use nexocrm_core::{AclError, AclResult, Page, UserId};
use nexocrm_infra::{
    AccessOverride, IdentityResolver, NewOverride, OverrideStore, PageCatalog, PathAuthorizer,
    UserDirectory,
};

use crate::context::SessionContext;

/// One page of the manager grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessMatrix {
    pub pages: Vec<Page>,
    pub rows: Vec<AccessMatrixRow>,
    pub current_page: u32,
    pub has_next_page: bool,
    pub total_rows: i64,
}

/// View model for one user row; assembled on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessMatrixRow {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub access_by_page_key: BTreeMap<String, bool>,
}

pub struct AppServices {
    catalog: PageCatalog,
    resolver: IdentityResolver,
    users: Arc<dyn UserDirectory>,
    overrides: Arc<dyn OverrideStore>,
    authorizer: Arc<dyn PathAuthorizer>,
}

impl AppServices {
    pub fn new(
        catalog: PageCatalog,
        resolver: IdentityResolver,
        users: Arc<dyn UserDirectory>,
        overrides: Arc<dyn OverrideStore>,
        authorizer: Arc<dyn PathAuthorizer>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            users,
            overrides,
            authorizer,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Caller identity
    // ─────────────────────────────────────────────────────────────────────

    /// Resolve the caller and require an active manager.
    async fn require_manager(&self, session: &SessionContext) -> AclResult<UserIdentity> {
        let identity = self
            .resolver
            .resolve(session.principal())
            .await
            .ok_or(AclError::Unauthenticated)?;

        if !identity.active || !identity.is_manager() {
            return Err(AclError::Forbidden);
        }
        Ok(identity)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Matrix read path
    // ─────────────────────────────────────────────────────────────────────

    /// Build one page of the {user × page → effective access} grid for the
    /// caller's organization.
    pub async fn access_matrix(
        &self,
        session: &SessionContext,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> AclResult<AccessMatrix> {
        let actor = self.require_manager(session).await?;

        if page < 1 {
            return Err(AclError::validation("page must be >= 1"));
        }
        if !(1..=100).contains(&page_size) {
            return Err(AclError::validation("page_size must be between 1 and 100"));
        }
        let offset = i64::from(page - 1) * i64::from(page_size);

        let pages = self.catalog.list_active().await;

        let (records, total) = self
            .users
            .search_active(&actor.org_id, search, offset, i64::from(page_size))
            .await
            .map_err(|e| AclError::upstream(e.to_string()))?;

        // One bulk lookup for exactly the returned user ids, never N+1.
        let ids: Vec<UserId> = records.iter().map(|r| r.id).collect();
        let overrides = self
            .overrides
            .for_users(&actor.org_id, &ids)
            .await
            .map_err(|e| AclError::upstream(e.to_string()))?;

        let mut by_cell: HashMap<(UserId, &str), bool> = HashMap::with_capacity(overrides.len());
        for o in &overrides {
            by_cell.insert((o.user_id, o.page_key.as_str()), o.allow);
        }

        let rows: Vec<AccessMatrixRow> = records
            .iter()
            .map(|record| {
                let target = record.identity();
                let access_by_page_key = pages
                    .iter()
                    .map(|p| {
                        let overridden = by_cell.get(&(record.id, p.key.as_str())).copied();
                        (
                            p.key.as_str().to_string(),
                            effective_access(&target, p, overridden),
                        )
                    })
                    .collect();

                AccessMatrixRow {
                    user_id: record.id,
                    name: record.name.clone(),
                    email: record.email.clone(),
                    role: record.role.clone(),
                    access_by_page_key,
                }
            })
            .collect();

        let returned = rows.len() as i64;
        let (total_rows, has_next_page) = match total {
            Some(total) => (total, offset + returned < total),
            // No exact count from the store: a full page suggests more.
            None => (offset + returned, returned == i64::from(page_size)),
        };

        Ok(AccessMatrix {
            pages,
            rows,
            current_page: page,
            has_next_page,
            total_rows,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Toggle write path
    // ─────────────────────────────────────────────────────────────────────

    /// Flip one cell of the matrix. Fail fast; first violation wins.
    pub async fn toggle_access(
        &self,
        session: &SessionContext,
        target_user_id: i64,
        page_key: &str,
        allow: bool,
    ) -> AclResult<AccessOverride> {
        let actor = self.require_manager(session).await?;

        if page_key.trim().is_empty() {
            return Err(AclError::validation("page_key is required"));
        }
        let target_id = UserId::new(target_user_id)
            .ok_or_else(|| AclError::validation("id_usuario must be a positive integer"))?;

        let pages = self.catalog.list_active().await;
        let page = pages
            .iter()
            .find(|p| p.key.as_str() == page_key)
            .ok_or_else(|| AclError::not_found(format!("unknown page '{page_key}'")))?;

        let target = self
            .users
            .find_in_org(&actor.org_id, target_id)
            .await
            .map_err(|e| AclError::upstream(e.to_string()))?
            .ok_or_else(|| AclError::not_found("target user not found in this organization"))?;

        // Escalation guard: the access-management capability can only be
        // held by accounts that already qualify as managers by role.
        // Granting it here would let the matrix mint new managers.
        if page.is_sensitive() && allow && !target.identity().is_manager() {
            return Err(AclError::validation(
                "cannot grant access management to a non-manager account",
            ));
        }

        self.overrides
            .upsert(NewOverride {
                user_id: target_id,
                org_id: actor.org_id.clone(),
                page_key: page.key.clone(),
                allow,
                actor: actor.id,
            })
            .await
            .map_err(|e| AclError::upstream(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Path guard
    // ─────────────────────────────────────────────────────────────────────

    /// Paths the current user may navigate to, or `None` when the request
    /// carries no resolvable (active) identity — callers deny all
    /// navigation in that case.
    pub async fn allowed_paths(&self, session: &SessionContext) -> Option<Vec<String>> {
        let identity = self.resolver.resolve(session.principal()).await?;
        if !identity.active {
            return None;
        }

        let pages = self.catalog.list_active().await;

        // Navigation must not hard-fail on override-store errors; a missing
        // override set just means defaults apply.
        let overrides = match self.overrides.for_user(&identity.org_id, identity.id).await {
            Ok(overrides) => overrides,
            Err(err) => {
                tracing::warn!(error = %err, "override load failed; computing paths from defaults");
                Vec::new()
            }
        };

        let by_key: HashMap<&str, bool> = overrides
            .iter()
            .map(|o| (o.page_key.as_str(), o.allow))
            .collect();

        Some(
            pages
                .iter()
                .filter(|p| {
                    effective_access(&identity, p, by_key.get(p.key.as_str()).copied())
                })
                .map(|p| p.path.clone())
                .collect(),
        )
    }

    /// Best-effort single-path check.
    ///
    /// Fails open when the authorizer errors: a transient outage must not
    /// lock every user out of navigation. Unresolvable identities are still
    /// denied.
    pub async fn is_path_allowed(&self, session: &SessionContext, path: &str) -> bool {
        let Some(identity) = self.resolver.resolve(session.principal()).await else {
            return false;
        };

        match self.authorizer.can_access(&identity, path).await {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(error = %err, path, "path authorization check failed; allowing");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use uuid::Uuid;

    use nexocrm_auth::Principal;
    use nexocrm_core::{fallback_catalog, OrgId, PageKey, SENSITIVE_PAGE_KEY};
    use nexocrm_infra::{InMemoryAclStore, PolicyPathAuthorizer, StoreError, UserRecord};

    const MANAGER_EXT: Uuid = Uuid::from_u128(1);
    const REP_EXT: Uuid = Uuid::from_u128(7);

    fn user(id: i64, external: Uuid, name: &str, role: &str, org: &str) -> UserRecord {
        UserRecord {
            id: UserId::new(id).unwrap(),
            external_id: Some(external),
            org_id: OrgId::new(org),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role: role.to_string(),
            secondary_role: String::new(),
            active: true,
        }
    }

    fn seeded_store() -> Arc<InMemoryAclStore> {
        let store = Arc::new(InMemoryAclStore::new());
        store.seed_pages(
            fallback_catalog()
                .into_iter()
                .filter(|p| {
                    matches!(p.key.as_str(), "dashboard" | "clientes" | SENSITIVE_PAGE_KEY)
                })
                .collect(),
        );
        store.add_user(user(1, MANAGER_EXT, "Marta Gestora", "Gestor", "org-1"));
        store.add_user(user(7, REP_EXT, "Rafael Rep", "Representante", "org-1"));
        store.add_user(user(20, Uuid::from_u128(20), "Outra Org", "Representante", "org-2"));
        store
    }

    fn services(store: Arc<InMemoryAclStore>) -> AppServices {
        let catalog = PageCatalog::new(store.clone());
        AppServices::new(
            catalog.clone(),
            IdentityResolver::new(store.clone()),
            store.clone(),
            store.clone(),
            Arc::new(PolicyPathAuthorizer::new(catalog, store)),
        )
    }

    fn session(external: Uuid) -> SessionContext {
        SessionContext::new(Principal {
            external_id: external,
            email: format!("{external}@example.com"),
        })
    }

    async fn paths_for(services: &AppServices, external: Uuid) -> Vec<String> {
        services.allowed_paths(&session(external)).await.unwrap()
    }

    // ── identity & permissions ───────────────────────────────────────────

    #[tokio::test]
    async fn matrix_requires_a_resolvable_identity() {
        let services = services(seeded_store());
        let err = services
            .access_matrix(&session(Uuid::from_u128(999)), None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(err, AclError::Unauthenticated);
    }

    #[tokio::test]
    async fn matrix_is_manager_only() {
        let services = services(seeded_store());
        let err = services
            .access_matrix(&session(REP_EXT), None, 1, 10)
            .await
            .unwrap_err();
        assert_eq!(err, AclError::Forbidden);
    }

    #[tokio::test]
    async fn matrix_rejects_out_of_range_pagination() {
        let services = services(seeded_store());
        for (page, page_size) in [(0, 10), (1, 0), (1, 101)] {
            let err = services
                .access_matrix(&session(MANAGER_EXT), None, page, page_size)
                .await
                .unwrap_err();
            assert!(matches!(err, AclError::Validation(_)), "{page}/{page_size}");
        }
    }

    #[tokio::test]
    async fn matrix_surfaces_store_errors_instead_of_absorbing_them() {
        let ok_store = seeded_store();
        let failing = Arc::new(InMemoryAclStore::new());
        failing.set_failing(true);

        let catalog = PageCatalog::new(ok_store.clone());
        let services = AppServices::new(
            catalog.clone(),
            IdentityResolver::new(ok_store.clone()),
            failing,
            ok_store.clone(),
            Arc::new(PolicyPathAuthorizer::new(catalog, ok_store)),
        );

        let err = services
            .access_matrix(&session(MANAGER_EXT), None, 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AclError::Upstream(_)));
    }

    // ── the sensitive floor ──────────────────────────────────────────────

    #[tokio::test]
    async fn sensitive_cell_is_denied_for_non_managers_even_with_an_allow_override() {
        let store = seeded_store();
        // Write the override directly, bypassing the toggle guard.
        store
            .upsert(NewOverride {
                user_id: UserId::new(7).unwrap(),
                org_id: OrgId::new("org-1"),
                page_key: PageKey::new(SENSITIVE_PAGE_KEY),
                allow: true,
                actor: UserId::new(1).unwrap(),
            })
            .await
            .unwrap();

        let services = services(store);
        let matrix = services
            .access_matrix(&session(MANAGER_EXT), None, 1, 10)
            .await
            .unwrap();

        let rep = matrix.rows.iter().find(|r| r.user_id.as_i64() == 7).unwrap();
        assert_eq!(rep.access_by_page_key[SENSITIVE_PAGE_KEY], false);

        let manager = matrix.rows.iter().find(|r| r.user_id.as_i64() == 1).unwrap();
        assert_eq!(manager.access_by_page_key[SENSITIVE_PAGE_KEY], true);

        let paths = paths_for(&services, REP_EXT).await;
        assert!(!paths.contains(&"/gestao-acessos".to_string()));
    }

    // ── toggle validation sequence ───────────────────────────────────────

    #[tokio::test]
    async fn toggle_rejects_unknown_pages() {
        let services = services(seeded_store());
        let err = services
            .toggle_access(&session(MANAGER_EXT), 7, "faturamento", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AclError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggle_enforces_organization_isolation() {
        let store = seeded_store();
        let services = services(store.clone());

        // User 20 exists, but in org-2; the org-1 manager cannot touch it.
        let err = services
            .toggle_access(&session(MANAGER_EXT), 20, "clientes", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AclError::NotFound(_)));
        assert_eq!(store.override_count(), 0);
    }

    #[tokio::test]
    async fn escalation_guard_rejects_granting_the_sensitive_page() {
        let store = seeded_store();
        let services = services(store.clone());

        let err = services
            .toggle_access(&session(MANAGER_EXT), 7, SENSITIVE_PAGE_KEY, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AclError::Validation(_)));
        assert_eq!(store.override_count(), 0, "a rejected toggle must not persist");

        let paths = paths_for(&services, REP_EXT).await;
        assert!(!paths.contains(&"/gestao-acessos".to_string()));
    }

    #[tokio::test]
    async fn revoking_the_sensitive_page_from_a_manager_is_allowed() {
        let services = services(seeded_store());
        let stored = services
            .toggle_access(&session(MANAGER_EXT), 1, SENSITIVE_PAGE_KEY, false)
            .await
            .unwrap();
        assert!(!stored.allow);
    }

    // ── toggle persistence semantics ─────────────────────────────────────

    #[tokio::test]
    async fn toggle_is_idempotent() {
        let store = seeded_store();
        let services = services(store.clone());

        for _ in 0..2 {
            let stored = services
                .toggle_access(&session(MANAGER_EXT), 7, "clientes", true)
                .await
                .unwrap();
            assert!(stored.allow);
            assert_eq!(stored.updated_by.as_i64(), 1);
        }
        assert_eq!(store.override_count(), 1);
    }

    #[tokio::test]
    async fn toggle_round_trip_leaves_one_row_and_the_last_value() {
        let store = seeded_store();
        let services = services(store.clone());

        services
            .toggle_access(&session(MANAGER_EXT), 7, "clientes", true)
            .await
            .unwrap();
        services
            .toggle_access(&session(MANAGER_EXT), 7, "clientes", false)
            .await
            .unwrap();

        assert_eq!(store.override_count(), 1);
        let paths = paths_for(&services, REP_EXT).await;
        assert!(!paths.contains(&"/clientes".to_string()));
    }

    // ── navigation ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn allowed_paths_exclude_the_sensitive_page_for_non_managers() {
        // Catalog: dashboard, clientes, gestao-acessos; user 7 has no overrides.
        let services = services(seeded_store());
        let paths = paths_for(&services, REP_EXT).await;

        assert!(paths.contains(&"/dashboard".to_string()));
        assert!(paths.contains(&"/clientes".to_string()));
        assert!(!paths.contains(&"/gestao-acessos".to_string()));
    }

    #[tokio::test]
    async fn a_deny_toggle_hides_the_page_from_navigation() {
        let services = services(seeded_store());
        services
            .toggle_access(&session(MANAGER_EXT), 7, "clientes", false)
            .await
            .unwrap();

        let paths = paths_for(&services, REP_EXT).await;
        assert!(!paths.contains(&"/clientes".to_string()));
        assert!(paths.contains(&"/dashboard".to_string()));
    }

    #[tokio::test]
    async fn allowed_paths_deny_all_without_an_identity() {
        let services = services(seeded_store());
        assert!(services
            .allowed_paths(&session(Uuid::from_u128(999)))
            .await
            .is_none());
    }

    struct FailingAuthorizer;

    #[async_trait]
    impl PathAuthorizer for FailingAuthorizer {
        async fn can_access(&self, _: &UserIdentity, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::new("can_access", "injected failure"))
        }
    }

    #[tokio::test]
    async fn path_check_fails_open_on_authorizer_errors() {
        let store = seeded_store();
        let services = AppServices::new(
            PageCatalog::new(store.clone()),
            IdentityResolver::new(store.clone()),
            store.clone(),
            store.clone(),
            Arc::new(FailingAuthorizer),
        );

        assert!(services.is_path_allowed(&session(REP_EXT), "/clientes").await);
        // Unresolvable identities are still denied.
        assert!(
            !services
                .is_path_allowed(&session(Uuid::from_u128(999)), "/clientes")
                .await
        );
    }

    // ── pagination ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn pagination_bounds_and_has_next_page() {
        let store = Arc::new(InMemoryAclStore::new());
        store.seed_pages(fallback_catalog());
        store.add_user(user(1, MANAGER_EXT, "Aaa Gestora", "Gestor", "org-1"));
        for i in 0..11 {
            store.add_user(user(
                100 + i,
                Uuid::from_u128(1000 + i as u128),
                &format!("User {:02}", i),
                "Representante",
                "org-1",
            ));
        }
        let services = services(store);

        let first = services
            .access_matrix(&session(MANAGER_EXT), None, 1, 10)
            .await
            .unwrap();
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.total_rows, 12);
        assert!(first.has_next_page);
        assert_eq!(first.current_page, 1);

        let second = services
            .access_matrix(&session(MANAGER_EXT), None, 2, 10)
            .await
            .unwrap();
        assert_eq!(second.rows.len(), 2);
        assert!(!second.has_next_page);
        assert_eq!(second.current_page, 2);
    }

    #[tokio::test]
    async fn search_filters_by_name_or_email() {
        let services = services(seeded_store());
        let matrix = services
            .access_matrix(&session(MANAGER_EXT), Some("rafael"), 1, 10)
            .await
            .unwrap();

        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].user_id.as_i64(), 7);
        assert_eq!(matrix.total_rows, 1);
        assert!(!matrix.has_next_page);
    }
}
