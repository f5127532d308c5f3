//! ACL failure taxonomy.

use thiserror::Error;

/// Result type used across the ACL engine.
pub type AclResult<T> = Result<T, AclError>;

/// Failure taxonomy for the ACL engine.
///
/// Each variant maps to exactly one HTTP status at the API boundary
/// (401/403/400/404/502/500), so keep the set closed and small.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    /// No resolvable identity on the request.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Identity resolved but inactive, or not a manager for a manager-only
    /// operation.
    #[error("forbidden")]
    Forbidden,

    /// Well-formed but semantically invalid request (missing field,
    /// escalation attempt, out-of-range pagination).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced page or target user does not exist, or belongs to a
    /// different organization than the actor.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store or identity provider returned an error.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Any other unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AclError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
