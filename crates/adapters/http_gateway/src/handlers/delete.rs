//! DELETE route: remove one item.

use serde_json::json;
use tablegate_app::ports::ItemStore;
use tablegate_app::services::ItemService;

use super::item_key;
use crate::error::ApiError;
use crate::event::GatewayResponse;
use crate::response;

pub async fn handle<S: ItemStore>(
    service: &ItemService<S>,
    segments: &[&str],
) -> Result<GatewayResponse, ApiError> {
    let ["items", rest @ ..] = segments else {
        return Err(ApiError::RouteNotFound);
    };
    let key = item_key(service.key_schema(), rest)?;
    let deleted = service.delete_item(&key).await?;
    Ok(response::json(
        200,
        &json!({"message": "Item deleted successfully", "deletedItem": deleted}),
    ))
}
