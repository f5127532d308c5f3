//! ACL route handlers.
//!
//! Handlers stay thin: extract, delegate to `AppServices`, map the result.

use std::sync::Arc;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::app::dto::{MatrixQuery, PathCheckQuery, ToggleRequest, ToggleResponse};
use crate::app::errors::{acl_error_to_response, status_for};
use crate::app::services::AppServices;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/paths", get(allowed_paths))
        .route("/paths/check", get(check_path))
        .route("/matrix", get(access_matrix))
        .route("/toggle", post(toggle_access))
}

/// GET /acl/paths - Paths the current user may navigate to.
async fn allowed_paths(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match services.allowed_paths(&session).await {
        Some(paths) => Json(json!({ "paths": paths })).into_response(),
        None => acl_error_to_response(nexocrm_core::AclError::Unauthenticated),
    }
}

/// GET /acl/paths/check?path=/clientes - Best-effort single-path check.
async fn check_path(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<PathCheckQuery>,
) -> Response {
    let allowed = services.is_path_allowed(&session, &query.path).await;
    Json(json!({ "path": query.path, "allowed": allowed })).into_response()
}

/// GET /acl/matrix?search=&page=&page_size= - Manager-only access grid.
async fn access_matrix(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<MatrixQuery>,
) -> Response {
    match services
        .access_matrix(&session, query.search.as_deref(), query.page, query.page_size)
        .await
    {
        Ok(matrix) => Json(matrix).into_response(),
        Err(err) => acl_error_to_response(err),
    }
}

/// POST /acl/toggle - Flip one user/page cell of the matrix.
async fn toggle_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    match services
        .toggle_access(&session, body.id_usuario, &body.page_key, body.allow)
        .await
    {
        Ok(stored) => Json(ToggleResponse::ok(stored)).into_response(),
        Err(err) => {
            let status = status_for(&err);
            (status, Json(ToggleResponse::err(err.to_string()))).into_response()
        }
    }
}
