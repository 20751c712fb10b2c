//! Request router. Dispatches an invocation by method and path.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use percent_encoding::percent_decode_str;
use tablegate_app::ports::ItemStore;
use tablegate_app::services::ItemService;
use tablegate_domain::error::error_chain;

use crate::error::ApiError;
use crate::event::{GatewayRequest, GatewayResponse};
use crate::handlers;
use crate::response;

/// Entry point for every invocation.
///
/// Holds only the shared service, so it is cheap to clone into each
/// concurrent invocation. `Clone` is implemented manually so the store type
/// itself does not need to be `Clone`.
pub struct Router<S> {
    service: Arc<ItemService<S>>,
}

impl<S> Clone for Router<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> Router<S>
where
    S: ItemStore + Send + Sync + 'static,
{
    pub fn new(service: ItemService<S>) -> Self {
        Self::from_arc(Arc::new(service))
    }

    /// Create a router from a service already shared elsewhere.
    pub fn from_arc(service: Arc<ItemService<S>>) -> Self {
        Self { service }
    }

    #[must_use]
    pub fn service(&self) -> &ItemService<S> {
        &self.service
    }

    /// Handle one invocation. Never fails: every error becomes a response.
    #[tracing::instrument(
        name = "request",
        skip_all,
        fields(
            http_method = %request.http_method,
            path = %request.path,
            request_id = request.request_id().unwrap_or("-"),
        )
    )]
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let started = Instant::now();
        tracing::info!("request received");

        let response = match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_internal() {
                    tracing::error!(
                        error = %error_chain(&err),
                        duration_ms = elapsed_ms(started),
                        "request failed"
                    );
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                err.into_response(&self.service.settings().environment)
            }
        };

        tracing::info!(
            status = response.status_code,
            duration_ms = elapsed_ms(started),
            "request completed"
        );
        response
    }

    async fn dispatch(&self, request: &GatewayRequest) -> Result<GatewayResponse, ApiError> {
        let decoded = path_segments(&request.path);
        let segments: Vec<&str> = decoded.iter().map(|segment| &**segment).collect();
        let service = self.service.as_ref();

        match request.http_method.to_ascii_uppercase().as_str() {
            "OPTIONS" => Ok(response::preflight()),
            "GET" => handlers::get::handle(service, request, &segments).await,
            "POST" => handlers::post::handle(service, request, &segments).await,
            "PUT" => handlers::put::handle(service, request, &segments).await,
            "DELETE" => handlers::delete::handle(service, &segments).await,
            _ => Err(ApiError::MethodNotAllowed),
        }
    }
}

/// Split a path into percent-decoded segments.
///
/// Empty segments are kept so `/items/` differs from `/items`, except for a
/// single trailing one after a key (`/items/u1/profile/`). An encoded `/`
/// stays inside its segment.
fn path_segments(path: &str) -> Vec<Cow<'_, str>> {
    let path = path.split('?').next().unwrap_or_default();
    let mut segments: Vec<Cow<'_, str>> = path
        .strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
        .collect();
    if segments.len() > 2 && segments.last().is_some_and(|last| last.is_empty()) {
        segments.pop();
    }
    segments
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tablegate_app::settings::Variant;

    use super::*;
    use crate::test_support::{InMemoryItemStore, router, router_with};

    async fn send(router: &Router<InMemoryItemStore>, request: GatewayRequest) -> (u16, Value) {
        let response = router.handle(request).await;
        let body = if response.body.is_empty() {
            Value::Null
        } else {
            response.json_body().unwrap()
        };
        (response.status_code, body)
    }

    fn post(path: &str, body: &Value) -> GatewayRequest {
        GatewayRequest::new("POST", path).with_body(body.to_string())
    }

    fn put(path: &str, body: &Value) -> GatewayRequest {
        GatewayRequest::new("PUT", path).with_body(body.to_string())
    }

    fn get(path: &str) -> GatewayRequest {
        GatewayRequest::new("GET", path)
    }

    #[test]
    fn should_split_path_keeping_empty_partition_segment() {
        assert_eq!(path_segments("/items"), vec!["items"]);
        assert_eq!(path_segments("/items/"), vec!["items", ""]);
        assert_eq!(path_segments("/items/u1/profile"), vec!["items", "u1", "profile"]);
        assert_eq!(path_segments("/items?x=1"), vec!["items"]);
    }

    #[test]
    fn should_drop_trailing_slash_after_key() {
        assert_eq!(path_segments("/items/u1/profile/"), vec!["items", "u1", "profile"]);
        assert_eq!(path_segments("/items/u1/"), vec!["items", "u1"]);
        assert_eq!(path_segments("/items//"), vec!["items", ""]);
    }

    #[test]
    fn should_decode_each_segment_when_path_is_percent_encoded() {
        assert_eq!(path_segments("/items/user%231/a%20b"), vec!["items", "user#1", "a b"]);
        assert_eq!(path_segments("/items/a%2Fb"), vec!["items", "a/b"]);
    }

    // ---------------------------------------------------------------
    // Routing
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn should_answer_preflight_on_any_path() {
        let router = router(Variant::Advanced);
        for path in ["/items", "/nowhere", "/"] {
            let response = router.handle(GatewayRequest::new("OPTIONS", path)).await;
            assert_eq!(response.status_code, 200);
            assert!(response.body.is_empty());
            assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        }
    }

    #[tokio::test]
    async fn should_reject_unknown_method() {
        let router = router(Variant::Advanced);
        let (status, body) = send(&router, GatewayRequest::new("PATCH", "/items/a")).await;
        assert_eq!(status, 405);
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn should_reject_unknown_path_for_known_method() {
        let router = router(Variant::Advanced);
        for request in [
            get("/orders"),
            get("/items/"),
            post("/query", &json!({})),
            put("/items", &json!({})),
            GatewayRequest::new("DELETE", "/batch"),
        ] {
            let (status, body) = send(&router, request).await;
            assert_eq!(status, 404);
            assert_eq!(body, json!({"error": "Endpoint not found"}));
        }
    }

    #[tokio::test]
    async fn should_attach_cors_headers_to_errors() {
        let router = router(Variant::Basic);
        let response = router.handle(get("/items/missing")).await;
        assert_eq!(response.status_code, 404);
        assert_eq!(
            response.headers["Access-Control-Allow-Methods"],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
    }

    // ---------------------------------------------------------------
    // Item lifecycle
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn should_create_then_read_item() {
        let router = router(Variant::Advanced);

        let (status, created) = send(
            &router,
            post("/items", &json!({"pk": "u1", "sk": "profile", "name": "Ann"})),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(created["message"], "Item created successfully");
        assert_eq!(created["item"]["version"], 1);
        assert!(created["item"]["created_at"].is_string());

        let (status, fetched) = send(&router, get("/items/u1/profile")).await;
        assert_eq!(status, 200);
        assert_eq!(fetched, created["item"]);
    }

    #[tokio::test]
    async fn should_address_item_through_percent_encoded_path() {
        let router = router(Variant::Advanced);
        let item = json!({"pk": "user#1", "sk": "a b", "name": "Ann"});
        send(&router, post("/items", &item)).await;

        let (status, fetched) = send(&router, get("/items/user%231/a%20b")).await;
        assert_eq!(status, 200);
        assert_eq!(fetched["name"], "Ann");

        let (status, updated) = send(
            &router,
            put("/items/user%231/a%20b", &json!({"name": "Bo", "version": 1})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(updated["item"]["name"], "Bo");

        let delete = GatewayRequest::new("DELETE", "/items/user%231/a%20b");
        let (status, deleted) = send(&router, delete).await;
        assert_eq!(status, 200);
        assert_eq!(deleted["deletedItem"]["pk"], "user#1");
    }

    #[tokio::test]
    async fn should_ignore_trailing_slash_after_key() {
        let router = router(Variant::Advanced);
        send(&router, post("/items", &json!({"pk": "u1", "sk": "profile"}))).await;

        let (status, fetched) = send(&router, get("/items/u1/profile/")).await;

        assert_eq!(status, 200);
        assert_eq!(fetched["sk"], "profile");
    }

    #[tokio::test]
    async fn should_report_missing_key_fields() {
        let router = router(Variant::Advanced);
        let (status, body) = send(&router, post("/items", &json!({"name": "Ann"}))).await;
        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({"error": "Validation failed", "details": ["pk is required", "sk is required"]})
        );
    }

    #[tokio::test]
    async fn should_conflict_when_creating_existing_key() {
        let router = router(Variant::Basic);
        send(&router, post("/items", &json!({"id": "a", "v": 1}))).await;

        let (status, body) = send(&router, post("/items", &json!({"id": "a", "v": 2}))).await;
        assert_eq!(status, 409);
        assert_eq!(body, json!({"error": "Item already exists"}));

        let (_, stored) = send(&router, get("/items/a")).await;
        assert_eq!(stored["v"], 1);
    }

    #[tokio::test]
    async fn should_update_with_current_version_and_reject_stale_one() {
        let router = router(Variant::Advanced);
        send(
            &router,
            post("/items", &json!({"pk": "u1", "sk": "profile", "name": "Ann"})),
        )
        .await;

        let (status, body) = send(
            &router,
            put("/items/u1/profile", &json!({"name": "Anna", "version": 1})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["message"], "Item updated successfully");
        assert_eq!(body["item"]["version"], 2);
        assert_eq!(body["item"]["name"], "Anna");

        let (status, body) = send(
            &router,
            put("/items/u1/profile", &json!({"name": "Bob", "version": 1})),
        )
        .await;
        assert_eq!(status, 409);
        assert_eq!(
            body,
            json!({"error": "Version conflict - item was modified by another request"})
        );
    }

    #[tokio::test]
    async fn should_not_create_item_through_update() {
        let router = router(Variant::Basic);
        let (status, body) = send(&router, put("/items/ghost", &json!({"x": 1}))).await;
        assert_eq!(status, 404);
        assert_eq!(body, json!({"error": "Item not found"}));
    }

    #[tokio::test]
    async fn should_reject_key_rewrite_through_update() {
        let router = router(Variant::Basic);
        send(&router, post("/items", &json!({"id": "a"}))).await;

        let (status, body) = send(&router, put("/items/a", &json!({"id": "b"}))).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "id is immutable"}));
    }

    #[tokio::test]
    async fn should_delete_item_and_return_last_state() {
        let router = router(Variant::Advanced);
        send(&router, post("/items", &json!({"pk": "u1", "sk": "default"}))).await;

        let (status, body) = send(&router, GatewayRequest::new("DELETE", "/items/u1")).await;
        assert_eq!(status, 200);
        assert_eq!(body["message"], "Item deleted successfully");
        assert_eq!(body["deletedItem"]["pk"], "u1");

        let (status, _) = send(&router, GatewayRequest::new("DELETE", "/items/u1")).await;
        assert_eq!(status, 404);
        let (status, _) = send(&router, get("/items/u1")).await;
        assert_eq!(status, 404);
    }

    // ---------------------------------------------------------------
    // Scans, queries, batches
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn should_page_scan_with_last_key() {
        let router = router(Variant::Advanced);
        let items: Vec<Value> = (0..55)
            .map(|i| json!({"pk": format!("p{i:02}"), "sk": "s"}))
            .collect();
        send(&router, post("/batch", &json!({ "items": items }))).await;

        let (status, first) = send(&router, get("/items")).await;
        assert_eq!(status, 200);
        assert_eq!(first["count"], 50);
        assert_eq!(first["lastEvaluatedKey"], json!({"pk": "p49", "sk": "s"}));

        let next = get("/items").with_query_param("lastKey", first["lastEvaluatedKey"].to_string());
        let (_, second) = send(&router, next).await;
        assert_eq!(second["count"], 5);
        assert!(second.get("lastEvaluatedKey").is_none());
        assert_eq!(second["scannedCount"], 5);
    }

    #[tokio::test]
    async fn should_reject_last_key_that_is_not_an_object() {
        let router = router(Variant::Basic);
        let (status, _) = send(&router, get("/items").with_query_param("lastKey", "p49")).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn should_reject_last_key_without_key_attributes() {
        let router = router(Variant::Advanced);
        send(&router, post("/items", &json!({"pk": "u1", "sk": "s"}))).await;

        let (status, body) = send(
            &router,
            get("/items").with_query_param("lastKey", json!({"name": "x"}).to_string()),
        )
        .await;

        assert_eq!(status, 400);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn should_keep_earlier_chunks_when_later_batch_write_fails() {
        let store = InMemoryItemStore::failing_on_batch(Variant::Basic.key_schema(), 2);
        let router = router_with(store, Variant::Basic, "development");
        let items: Vec<Value> = (0..60).map(|i| json!({"id": format!("i{i:02}")})).collect();

        let (status, _) = send(&router, post("/batch", &json!({ "items": items }))).await;
        assert_eq!(status, 500);

        let (_, page) = send(&router, get("/items")).await;
        assert_eq!(page["count"], 25);
        assert_eq!(page["items"][24]["id"], "i24");
    }

    #[tokio::test]
    async fn should_write_batch_in_chunks() {
        let router = router(Variant::Basic);
        let items: Vec<Value> = (0..30).map(|i| json!({"id": format!("i{i}")})).collect();

        let (status, body) = send(&router, post("/batch", &json!({ "items": items }))).await;

        assert_eq!(status, 201);
        assert_eq!(body["message"], "Batch write completed");
        assert_eq!(body["processedItems"], 30);
        assert_eq!(
            body["results"],
            json!([
                {"items": 25, "unprocessedItems": []},
                {"items": 5, "unprocessedItems": []},
            ])
        );
    }

    #[tokio::test]
    async fn should_reject_batch_without_items() {
        let router = router(Variant::Basic);
        let (status, body) = send(&router, post("/batch", &json!({"items": []}))).await;
        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({"error": "items array is required and must not be empty"})
        );
    }

    #[tokio::test]
    async fn should_write_nothing_when_batch_has_invalid_item() {
        let router = router(Variant::Basic);
        let body = json!({"items": [{"id": "a"}, {"name": "no id"}]});

        let (status, response) = send(&router, post("/batch", &body)).await;
        assert_eq!(status, 400);
        assert_eq!(
            response["details"],
            json!([{"index": 1, "errors": ["id is required"]}])
        );

        let (_, page) = send(&router, get("/items")).await;
        assert_eq!(page["count"], 0);
    }

    #[tokio::test]
    async fn should_query_index_with_sort_condition() {
        let router = router(Variant::Advanced);
        for (pk, day) in [("o1", "2024-01-05"), ("o2", "2024-02-10"), ("o3", "2024-03-01")] {
            let item = json!({"pk": pk, "sk": "order", "gsi1pk": "user#1", "gsi1sk": day});
            send(&router, post("/items", &item)).await;
        }

        let request = get("/query")
            .with_query_param("gsi", "gsi1")
            .with_query_param("pk", "user#1")
            .with_query_param("sk", "2024-02")
            .with_query_param("skCondition", ">=");
        let (status, body) = send(&router, request).await;

        assert_eq!(status, 200);
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn should_require_index_and_partition_for_query() {
        let router = router(Variant::Advanced);
        let (status, body) = send(&router, get("/query").with_query_param("gsi", "gsi1")).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "gsi and pk parameters are required"}));
    }

    #[tokio::test]
    async fn should_reject_unsupported_sort_condition() {
        let router = router(Variant::Advanced);
        let request = get("/query")
            .with_query_param("gsi", "gsi1")
            .with_query_param("pk", "a")
            .with_query_param("sk", "b")
            .with_query_param("skCondition", "between");
        let (status, _) = send(&router, request).await;
        assert_eq!(status, 400);
    }

    // ---------------------------------------------------------------
    // Diagnostics and failures
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn should_report_health_with_deployment_details() {
        let router = router(Variant::Advanced);
        let (status, body) = send(&router, get("/health")).await;

        assert_eq!(status, 200);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "advanced-serverless-api");
        assert_eq!(body["tableName"], "items-table");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn should_stay_up_but_degraded_when_store_fails() {
        let store = InMemoryItemStore::broken(Variant::Test.key_schema());
        let router = router_with(store, Variant::Test, "production");

        let (status, body) = send(&router, get("/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "error");
        assert_eq!(body["databaseError"], "storage error: table unavailable");

        let (status, body) = send(&router, get("/test")).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Store connection failed");
    }

    #[tokio::test]
    async fn should_confirm_connectivity_on_test_route() {
        let router = router(Variant::Test);
        let (status, body) = send(&router, get("/test")).await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"message": "Store connection successful", "tableName": "items-table"})
        );
    }

    #[tokio::test]
    async fn should_hide_store_errors_in_production() {
        let store = InMemoryItemStore::broken(Variant::Basic.key_schema());
        let router = router_with(store, Variant::Basic, "production");

        let (status, body) = send(&router, get("/items")).await;

        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({"error": "Internal server error", "message": "An unexpected error occurred"})
        );
    }

    #[tokio::test]
    async fn should_treat_malformed_json_as_internal_error() {
        let router = router(Variant::Basic);
        let request = GatewayRequest::new("POST", "/items").with_body("{not json");

        let (status, body) = send(&router, request).await;

        assert_eq!(status, 500);
        assert_eq!(body["error"], "Internal server error");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("malformed request body")
        );
    }
}
