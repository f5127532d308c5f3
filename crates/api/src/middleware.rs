use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use nexocrm_auth::{validate_claims, Principal, SessionClaims, TokenValidationError};

use crate::context::SessionContext;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed or unverifiable token")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Session token verification boundary.
pub trait SessionValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, SessionError>;
}

/// HS256 verifier for tokens minted by the identity provider.
///
/// Signature verification happens here; the claims window is checked by
/// the deterministic validator in the auth crate.
pub struct Hs256SessionValidator {
    key: DecodingKey,
}

impl Hs256SessionValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }
}

impl SessionValidator for Hs256SessionValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let decoded = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &validation)
            .map_err(|_| SessionError::Invalid)?;

        validate_claims(&decoded.claims, now)?;
        Ok(decoded.claims.principal())
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let principal = state
        .sessions
        .validate(token, Utc::now())
        .map_err(|_e| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(SessionContext::new(principal));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
