use nexocrm_auth::Principal;

/// Session context for a request (externally authenticated principal).
///
/// This is immutable and must be present for all ACL routes. The internal
/// application user is resolved from it fresh on every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    principal: Principal,
}

impl SessionContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
