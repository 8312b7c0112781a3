//! Key responder module
//!
//! Serves a fixed JSON payload for each configured key. The body is rendered
//! once when the route is registered.

use crate::config::{KeyEntry, KeyStyle};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Path served for a key
pub fn key_path(name: &str) -> String {
    format!("/key/{}", name)
}

/// Pre-rendered response for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyResponse {
    body: String,
}

impl KeyResponse {
    pub fn new(entry: &KeyEntry, style: KeyStyle) -> Self {
        let body = match style {
            KeyStyle::Value => serde_json::json!({ "value": entry.value }),
            KeyStyle::Key => serde_json::json!({ "key": entry.name }),
        };

        Self {
            body: body.to_string(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl IntoResponse for KeyResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}
