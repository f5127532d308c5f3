//! Path authorization boundary.
//!
//! `isPathAllowed` delegates to this seam so the check can be backed by an
//! external authorization primitive. The caller (the path guard in the API
//! crate) fails open when this returns an error — a transient authorizer
//! outage must not lock every user out of navigation.

use std::sync::Arc;

use async_trait::async_trait;

use nexocrm_auth::{effective_access, UserIdentity};

use crate::catalog::PageCatalog;
use crate::store::{OverrideStore, StoreError};

/// Best-effort "can this user open this path" check.
#[async_trait]
pub trait PathAuthorizer: Send + Sync {
    async fn can_access(&self, identity: &UserIdentity, path: &str) -> Result<bool, StoreError>;
}

/// Default authorizer: answers from the same effective-access computation
/// the rest of the engine uses. Paths outside the active catalog are
/// denied.
pub struct PolicyPathAuthorizer {
    catalog: PageCatalog,
    overrides: Arc<dyn OverrideStore>,
}

impl PolicyPathAuthorizer {
    pub fn new(catalog: PageCatalog, overrides: Arc<dyn OverrideStore>) -> Self {
        Self { catalog, overrides }
    }
}

#[async_trait]
impl PathAuthorizer for PolicyPathAuthorizer {
    async fn can_access(&self, identity: &UserIdentity, path: &str) -> Result<bool, StoreError> {
        let pages = self.catalog.list_active().await;
        let Some(page) = pages.iter().find(|p| p.path == path) else {
            return Ok(false);
        };

        let overridden = self
            .overrides
            .for_user(&identity.org_id, identity.id)
            .await?
            .into_iter()
            .find(|o| o.page_key == page.key)
            .map(|o| o.allow);

        Ok(effective_access(identity, page, overridden))
    }
}
