//! Conversions between HTTP requests and gateway events.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tablegate_adapter_http_gateway::{GatewayRequest, GatewayResponse};

/// Header whose value becomes the event's request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build a gateway event from the parts of an HTTP request.
///
/// A request without an `x-request-id` header gets a fresh UUID.
#[must_use]
pub fn to_gateway_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: &Bytes,
) -> GatewayRequest {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

    let mut request = GatewayRequest::new(method.as_str(), uri.path()).with_request_id(request_id);
    if !body.is_empty() {
        request = request.with_body(String::from_utf8_lossy(body));
    }
    for (name, value) in query {
        request = request.with_query_param(name, value);
    }
    request
}

/// HTTP rendering of a gateway response.
pub struct GatewayReply(pub GatewayResponse);

impl IntoResponse for GatewayReply {
    fn into_response(self) -> Response {
        let GatewayResponse {
            status_code,
            headers,
            body,
        } = self.0;
        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, body).into_response();
        for (name, value) in headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}
