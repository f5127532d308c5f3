//! Pure page-access decision logic.
//!
//! - No IO
//! - No panics
//! - Three explicit layers, evaluated in precedence order, returned as a
//!   new value and never mutated after construction.

use nexocrm_core::Page;

use crate::UserIdentity;

/// Effective access for one (user, page) cell.
///
/// Precedence, first matching rule wins:
/// 1. **Sensitive floor** — a non-manager never sees the access-management
///    page. This is a hard floor, not a default: a stored override cannot
///    lift it.
/// 2. **Override** — a stored per-(user, page) allow/deny value.
/// 3. **Default** — see [`default_access`].
///
/// The floor is evaluated against the *target* user's manager status, so a
/// manager browsing the grid sees other managers' sensitive cell as
/// override-or-default while non-managers' cells always read denied.
pub fn effective_access(target: &UserIdentity, page: &Page, overridden: Option<bool>) -> bool {
    if page.is_sensitive() && !target.is_manager() {
        return false;
    }
    if let Some(allow) = overridden {
        return allow;
    }
    default_access(target, page)
}

/// Default access before overrides are known.
///
/// Ordinary pages are open (least-friction CRM); the access-management page
/// is closed to non-managers.
pub fn default_access(target: &UserIdentity, page: &Page) -> bool {
    !(page.is_sensitive() && !target.is_manager())
}
