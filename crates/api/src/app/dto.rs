//! Request/response payloads for the ACL routes.
//!
//! Field names on the wire follow the frontend contract (`id_usuario`,
//! `page_key`), not internal naming.

use serde::{Deserialize, Serialize};

use nexocrm_infra::AccessOverride;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub id_usuario: i64,
    pub page_key: String,
    pub allow: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub ok: bool,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub stored: Option<AccessOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToggleResponse {
    pub fn ok(stored: AccessOverride) -> Self {
        Self {
            ok: true,
            stored: Some(stored),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            stored: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    25
}

#[derive(Debug, Deserialize)]
pub struct PathCheckQuery {
    pub path: String,
}
