use nexocrm_core::{OrgId, UserId};

use crate::Role;

/// Resolved internal application user.
///
/// Resolved fresh on every request from the user table; never cached across
/// requests and never mutated by this engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: UserId,
    pub org_id: OrgId,
    pub role: Role,
    pub secondary_role: Role,
    pub active: bool,
}

impl UserIdentity {
    /// A user is a manager if either role field qualifies.
    pub fn is_manager(&self) -> bool {
        self.role.is_manager() || self.secondary_role.is_manager()
    }
}
