//! POST routes: single create and batch create.

use serde_json::json;
use tablegate_app::ports::ItemStore;
use tablegate_app::services::ItemService;

use super::json_body;
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
            let item = service.create_item(json_body(request)?).await?;
            Ok(response::json(
                201,
                &json!({"message": "Item created successfully", "item": item}),
            ))
        }
        ["batch"] => {
            let report = service.create_batch(json_body(request)?).await?;
            Ok(response::json(
                201,
                &json!({
                    "message": "Batch write completed",
                    "processedItems": report.processed_items,
                    "results": report.results,
                }),
            ))
        }
        _ => Err(ApiError::RouteNotFound),
    }
}
