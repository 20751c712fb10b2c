//! GET routes: scan, point lookup, index query, health and connectivity.

use serde_json::json;
use tablegate_app::ports::ItemStore;
use tablegate_app::services::ItemService;
use tablegate_domain::error::error_chain;
use tablegate_domain::query::IndexQuery;

use super::{continuation, item_key};
use crate::error::ApiError;
use crate::event::{GatewayRequest, GatewayResponse};
use crate::response;

pub async fn handle<S: ItemStore>(
    service: &ItemService<S>,
    request: &GatewayRequest,
    segments: &[&str],
) -> Result<GatewayResponse, ApiError> {
    match segments {
        ["items"] => {
            let page = service.list_items(continuation(request)?).await?;
            Ok(response::json(200, &page))
        }
        ["items", rest @ ..] => {
            let key = item_key(service.key_schema(), rest)?;
            let item = service.get_item(&key).await?;
            Ok(response::json(200, &item))
        }
        ["query"] => {
            let query = IndexQuery::from_params(
                request.query_param("gsi"),
                request.query_param("pk"),
                request.query_param("sk"),
                request.query_param("skCondition"),
            )?;
            let page = service.query_items(&query, continuation(request)?).await?;
            Ok(response::json(200, &page))
        }
        ["health"] => {
            let report = service.check_health().await;
            Ok(response::json(200, &report))
        }
        ["test"] => Ok(connectivity(service).await),
        _ => Err(ApiError::RouteNotFound),
    }
}

async fn connectivity<S: ItemStore>(service: &ItemService<S>) -> GatewayResponse {
    match service.check_connectivity().await {
        Ok(()) => response::json(
            200,
            &json!({
                "message": "Store connection successful",
                "tableName": service.settings().table_name,
            }),
        ),
        Err(err) => {
            tracing::error!(error = %error_chain(&err), "store connectivity check failed");
            response::json(
                500,
                &json!({
                    "error": "Store connection failed",
                    "message": error_chain(&err),
                }),
            )
        }
    }
}
