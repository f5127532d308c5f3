//! Mapping from the engine's failure taxonomy to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use nexocrm_core::AclError;

pub fn status_for(err: &AclError) -> StatusCode {
    match err {
        AclError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AclError::Forbidden => StatusCode::FORBIDDEN,
        AclError::Validation(_) => StatusCode::BAD_REQUEST,
        AclError::NotFound(_) => StatusCode::NOT_FOUND,
        AclError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AclError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for(err: &AclError) -> &'static str {
    match err {
        AclError::Unauthenticated => "unauthenticated",
        AclError::Forbidden => "forbidden",
        AclError::Validation(_) => "validation_error",
        AclError::NotFound(_) => "not_found",
        AclError::Upstream(_) => "upstream_failure",
        AclError::Internal(_) => "internal_error",
    }
}

pub fn acl_error_to_response(err: AclError) -> Response {
    json_error(status_for(&err), code_for(&err), &err.to_string())
}

pub fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}
