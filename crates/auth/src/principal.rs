use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Externally authenticated session principal.
///
/// Produced by the identity provider once a session token has been
/// verified; this engine only consumes it to resolve the internal
/// application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject id issued by the identity provider.
    pub external_id: Uuid,

    /// Email linked to the subject at the provider.
    pub email: String,
}
