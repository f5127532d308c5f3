//! Page catalog read path.
//!
//! The store read is an ordinary `Result`; degrading to the built-in
//! fallback happens in exactly one place here, so the behavior stays a
//! single auditable decision point instead of scattered error handling.

use std::sync::Arc;

use nexocrm_core::{fallback_catalog, Page};

use crate::store::{CatalogStore, StoreError};

#[derive(Clone)]
pub struct PageCatalog {
    store: Arc<dyn CatalogStore>,
}

impl PageCatalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Result-returning read at the store boundary.
    pub async fn try_list_active(&self) -> Result<Vec<Page>, StoreError> {
        self.store.list_active().await
    }

    /// Active pages, or the built-in fallback when the backing table is
    /// missing, unreachable, or empty. Never fails: navigation must always
    /// have at least a minimal set of pages to reason about.
    pub async fn list_active(&self) -> Vec<Page> {
        match self.try_list_active().await {
            Ok(pages) if !pages.is_empty() => pages,
            Ok(_) => {
                tracing::warn!("page catalog is empty; serving built-in fallback");
                fallback_catalog()
            }
            Err(err) => {
                tracing::warn!(error = %err, "page catalog unavailable; serving built-in fallback");
                fallback_catalog()
            }
        }
    }
}
