//! Shared response formatter: JSON bodies with CORS headers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::event::GatewayResponse;

pub const CONTENT_TYPE: &str = "application/json";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type,Authorization";
pub const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Headers attached to every response.
#[must_use]
pub fn cors_headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", CONTENT_TYPE),
        ("Access-Control-Allow-Origin", ALLOW_ORIGIN),
        ("Access-Control-Allow-Headers", ALLOW_HEADERS),
        ("Access-Control-Allow-Methods", ALLOW_METHODS),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Serialize `payload` as the response body.
///
/// A payload that fails to serialize becomes a bare 500.
pub fn json<T: Serialize>(status_code: u16, payload: &T) -> GatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => GatewayResponse {
            status_code,
            headers: cors_headers(),
            body,
        },
        Err(err) => {
            tracing::error!(error = %err, "failed to encode response body");
            GatewayResponse {
                status_code: 500,
                headers: cors_headers(),
                body: r#"{"error":"Internal server error"}"#.to_string(),
            }
        }
    }
}

/// Response to a CORS preflight: headers only.
#[must_use]
pub fn preflight() -> GatewayResponse {
    GatewayResponse {
        status_code: 200,
        headers: cors_headers(),
        body: String::new(),
    }
}
