//! Axum router assembly.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Uri};
use tablegate_adapter_http_gateway::Router as GatewayRouter;
use tablegate_app::ports::ItemStore;
use tower_http::trace::TraceLayer;

use crate::bridge::{GatewayReply, to_gateway_request};

/// Build the top-level axum [`Router`](axum::Router).
///
/// Every method and path falls through to the gateway router, which owns
/// routing and error mapping. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<S>(gateway: GatewayRouter<S>) -> axum::Router
where
    S: ItemStore + Send + Sync + 'static,
{
    axum::Router::new()
        .fallback(forward::<S>)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn forward<S>(
    State(gateway): State<GatewayRouter<S>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> GatewayReply
where
    S: ItemStore + Send + Sync + 'static,
{
    let request = to_gateway_request(&method, &uri, &headers, query, &body);
    GatewayReply(gateway.handle(request).await)
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tablegate_app::ports::{CreateOutcome, UpdateOutcome};
    use tablegate_app::services::ItemService;
    use tablegate_app::settings::{ServiceSettings, Variant};
    use tablegate_domain::batch::ChunkResult;
    use tablegate_domain::error::CrudError;
    use tablegate_domain::item::Item;
    use tablegate_domain::key::ItemKey;
    use tablegate_domain::page::{Page, PageRequest};
    use tablegate_domain::query::IndexQuery;
    use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};
    use tower::ServiceExt;

    use super::*;

    struct StubItemStore;

    impl ItemStore for StubItemStore {
        fn get(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send {
            let item = (key.partition() == "known").then(|| Item::new().with("id", "known"));
            async { Ok(item) }
        }

        async fn create(&self, _key: &ItemKey, _item: Item) -> Result<CreateOutcome, CrudError> {
            Ok(CreateOutcome::Created)
        }

        async fn update(
            &self,
            _key: &ItemKey,
            _update: &FieldUpdateSet,
            _guard: UpdateGuard,
        ) -> Result<UpdateOutcome, CrudError> {
            Ok(UpdateOutcome::Missing)
        }

        async fn delete(&self, _key: &ItemKey) -> Result<Option<Item>, CrudError> {
            Ok(None)
        }

        async fn scan(&self, _page: PageRequest) -> Result<Page, CrudError> {
            Ok(Page::new(vec![Item::new().with("id", "known")], None))
        }

        async fn query(&self, _query: &IndexQuery, _page: PageRequest) -> Result<Page, CrudError> {
            Ok(Page::default())
        }

        async fn batch_put(&self, items: &[Item]) -> Result<ChunkResult, CrudError> {
            Ok(ChunkResult {
                items: items.len(),
                unprocessed_items: Vec::new(),
            })
        }

        async fn probe(&self) -> Result<(), CrudError> {
            Ok(())
        }
    }

    fn app() -> axum::Router {
        let service = ItemService::new(StubItemStore, ServiceSettings::new(Variant::Basic, "t"));
        build(GatewayRouter::new(service))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_serve_item_through_gateway_router() {
        let response = app()
            .oneshot(Request::get("/items/known").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_json(response).await, json!({"id": "known"}));
    }

    #[tokio::test]
    async fn should_forward_request_body() {
        let response = app()
            .oneshot(
                Request::post("/items")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"id":"new"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["item"]["id"], "new");
        assert_eq!(body["item"]["version"], 1);
    }

    #[tokio::test]
    async fn should_map_gateway_errors_to_http_status() {
        let response = app()
            .oneshot(Request::get("/items/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app()
            .oneshot(
                Request::patch("/items/known")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn should_answer_preflight_with_empty_body() {
        let response = app()
            .oneshot(
                Request::options("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
