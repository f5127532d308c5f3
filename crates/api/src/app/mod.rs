//! Application assembly: stores, services, middleware, router.

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Extension, Router};
use sqlx::PgPool;

use nexocrm_infra::{
    IdentityResolver, PageCatalog, PolicyPathAuthorizer, PostgresAclStore,
};

use crate::middleware::{auth_middleware, AuthState, Hs256SessionValidator};
use services::AppServices;

/// Wire the full application router on top of a Postgres pool.
pub fn build_app(pool: PgPool, jwt_secret: &str) -> Router {
    let store = Arc::new(PostgresAclStore::new(pool));

    let catalog = PageCatalog::new(store.clone());
    let authorizer = Arc::new(PolicyPathAuthorizer::new(catalog.clone(), store.clone()));

    let services = Arc::new(AppServices::new(
        catalog,
        IdentityResolver::new(store.clone()),
        store.clone(),
        store,
        authorizer,
    ));

    let auth_state = AuthState {
        sessions: Arc::new(Hs256SessionValidator::new(jwt_secret.as_bytes())),
    };

    let protected = routes::router()
        .layer(Extension(services))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
