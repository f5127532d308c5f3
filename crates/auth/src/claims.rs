use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Principal;

/// Session token claims (transport-agnostic).
///
/// This is the minimal set of claims the engine expects once a token has
/// been decoded/verified by whatever transport/security layer is in use.
/// Timestamps are seconds since the epoch, matching the JWT wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject id issued by the identity provider.
    pub sub: Uuid,

    /// Email linked to the subject at the provider.
    pub email: String,

    /// Issued-at (JWT `iat`).
    pub iat: i64,

    /// Expiration (JWT `exp`).
    pub exp: i64,
}

impl SessionClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            external_id: self.sub,
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification /
/// decoding is intentionally outside this crate.
pub fn validate_claims(
    claims: &SessionClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> SessionClaims {
        SessionClaims {
            sub: Uuid::now_v7(),
            email: "user@example.com".to_string(),
            iat,
            exp,
        }
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn accepts_a_token_inside_its_window() {
        assert_eq!(validate_claims(&claims(100, 200), at(150)), Ok(()));
    }

    #[test]
    fn rejects_expired_tokens() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(200)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_tokens_issued_in_the_future() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(50)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn rejects_inverted_time_windows() {
        assert_eq!(
            validate_claims(&claims(200, 100), at(150)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
