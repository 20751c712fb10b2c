//! Per-method request handlers.
//!
//! Each handler matches the path segments of its method and performs one
//! service call. Shared request decoding lives here.

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use serde_json::Value;
use tablegate_domain::key::{ItemKey, KeySchema};
use tablegate_domain::page::ContinuationToken;

use crate::error::ApiError;
use crate::event::GatewayRequest;

/// Query parameter carrying a continuation token.
pub const LAST_KEY_PARAM: &str = "lastKey";

/// Key addressed by the segments following `/items`.
///
/// Extra segments or an empty partition segment do not name a route.
pub(crate) fn item_key(schema: KeySchema, segments: &[&str]) -> Result<ItemKey, ApiError> {
    if segments.len() > schema.attribute_names().len() {
        return Err(ApiError::RouteNotFound);
    }
    schema
        .key_from_segments(segments)
        .ok_or(ApiError::RouteNotFound)
}

/// Decode the JSON body; an absent or empty body reads as `null`.
pub(crate) fn json_body(request: &GatewayRequest) -> Result<Value, ApiError> {
    match request.body.as_deref() {
        None => Ok(Value::Null),
        Some(text) if text.trim().is_empty() => Ok(Value::Null),
        Some(text) => serde_json::from_str(text).map_err(ApiError::MalformedBody),
    }
}

pub(crate) fn continuation(request: &GatewayRequest) -> Result<Option<ContinuationToken>, ApiError> {
    request
        .query_param(LAST_KEY_PARAM)
        .map(ContinuationToken::parse)
        .transpose()
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_sort_key_when_composite_path_has_one_segment() {
        let key = item_key(KeySchema::Composite, &["u1"]).unwrap();
        assert_eq!(key, ItemKey::composite("u1", "default"));
    }

    #[test]
    fn should_reject_extra_segments() {
        assert!(matches!(
            item_key(KeySchema::Simple, &["a", "b"]),
            Err(ApiError::RouteNotFound)
        ));
        assert!(matches!(
            item_key(KeySchema::Composite, &["a", "b", "c"]),
            Err(ApiError::RouteNotFound)
        ));
    }

    #[test]
    fn should_reject_empty_partition_segment() {
        assert!(matches!(
            item_key(KeySchema::Composite, &[""]),
            Err(ApiError::RouteNotFound)
        ));
    }

    #[test]
    fn should_read_missing_body_as_null() {
        let request = GatewayRequest::new("POST", "/items");
        assert_eq!(json_body(&request).unwrap(), Value::Null);
    }

    #[test]
    fn should_reject_malformed_body() {
        let request = GatewayRequest::new("POST", "/items").with_body("{\"pk\":");
        assert!(matches!(json_body(&request), Err(ApiError::MalformedBody(_))));
    }

    #[test]
    fn should_parse_last_key_parameter() {
        let request =
            GatewayRequest::new("GET", "/items").with_query_param("lastKey", r#"{"id":"7"}"#);
        let token = continuation(&request).unwrap().unwrap();
        assert_eq!(token.get_str("id"), Some("7"));

        let bad = GatewayRequest::new("GET", "/items").with_query_param("lastKey", "7");
        assert!(continuation(&bad).is_err());
    }
}
