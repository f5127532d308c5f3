pub mod acl;
pub mod system;

use axum::Router;

/// Routes that require an authenticated session.
pub fn router() -> Router {
    Router::new().nest("/acl", acl::router())
}
