//! PUT route: partial update of one item.

use serde_json::json;
use tablegate_app::ports::ItemStore;
use tablegate_app::services::ItemService;

use super::{item_key, json_body};
use crate::error::ApiError;
use crate::event::{GatewayRequest, GatewayResponse};
use crate::response;

pub async fn handle<S: ItemStore>(
    service: &ItemService<S>,
    request: &GatewayRequest,
    segments: &[&str],
) -> Result<GatewayResponse, ApiError> {
    let ["items", rest @ ..] = segments else {
        return Err(ApiError::RouteNotFound);
    };
    let key = item_key(service.key_schema(), rest)?;
    let item = service.update_item(&key, json_body(request)?).await?;
    Ok(response::json(
        200,
        &json!({"message": "Item updated successfully", "item": item}),
    ))
}
