//! The page catalog model.
//!
//! Pages are created/maintained by configuration (migrations or admin
//! tooling); this engine treats them as read-only facts.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Key of the access-management page.
///
/// This page is protected by the override-proof floor rule: a non-manager
/// can never open it, no matter what is stored in the override table.
pub const SENSITIVE_PAGE_KEY: &str = "gestao-acessos";

/// Stable key of an ACL-able page (the join key used everywhere else).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageKey(Cow<'static, str>);

impl PageKey {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ACL-able CRM page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub key: PageKey,
    pub path: String,
    pub label: String,
    pub sort_order: i32,
    pub is_active: bool,
}

impl Page {
    pub fn is_sensitive(&self) -> bool {
        self.key.as_str() == SENSITIVE_PAGE_KEY
    }
}

/// Fixed built-in catalog used when the `pages` table is unreachable,
/// absent, or empty. Keeps navigation and the policy engine working before
/// the catalog has been provisioned.
pub fn fallback_catalog() -> Vec<Page> {
    fn page(key: &'static str, path: &str, label: &str, sort_order: i32) -> Page {
        Page {
            key: PageKey::new(key),
            path: path.to_string(),
            label: label.to_string(),
            sort_order,
            is_active: true,
        }
    }

    vec![
        page("dashboard", "/dashboard", "Dashboard", 10),
        page("clientes", "/clientes", "Clientes", 20),
        page("empresas", "/empresas", "Empresas", 30),
        page("pedidos", "/pedidos", "Pedidos", 40),
        page("campanhas", "/campanhas", "Campanhas", 50),
        page("agenda", "/agenda", "Agenda", 60),
        page(SENSITIVE_PAGE_KEY, "/gestao-acessos", "Gestão de Acessos", 70),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_ordered_and_active() {
        let pages = fallback_catalog();
        assert!(!pages.is_empty());
        assert!(pages.iter().all(|p| p.is_active));
        assert!(pages.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
    }

    #[test]
    fn fallback_contains_the_sensitive_page() {
        let pages = fallback_catalog();
        assert_eq!(pages.iter().filter(|p| p.is_sensitive()).count(), 1);
    }
}
