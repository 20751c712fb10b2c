//! Pagination for scans and queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::item::Item;
use crate::key::{ItemKey, KeySchema};

/// Opaque marker returned by a paginated read, passed back to resume it.
///
/// Stores fill it with the key attributes of the last evaluated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(Map<String, Value>);

impl ContinuationToken {
    #[must_use]
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Decode the JSON text callers send in the `lastKey` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidContinuationToken`] when the text is
    /// not a JSON object.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            _ => Err(ValidationError::InvalidContinuationToken),
        }
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Table key the token resumes after.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidContinuationToken`] when the token
    /// lacks one of the schema's key attributes.
    pub fn item_key(&self, schema: KeySchema) -> Result<ItemKey, ValidationError> {
        schema
            .key_of(&Item::from(self.0.clone()))
            .map_err(|_| ValidationError::InvalidContinuationToken)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<&ItemKey> for ContinuationToken {
    fn from(key: &ItemKey) -> Self {
        Self(key.to_json())
    }
}

/// Where a paginated read starts and how much it may return.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Maximum number of items to evaluate; `None` reads to the end.
    pub limit: Option<usize>,
    /// Resume after this position.
    pub start: Option<ContinuationToken>,
}

impl PageRequest {
    #[must_use]
    pub fn new(limit: Option<usize>, start: Option<ContinuationToken>) -> Self {
        Self { limit, start }
    }
}

/// One page of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Item>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<ContinuationToken>,
    pub scanned_count: usize,
}

impl Page {
    /// Page whose `count` matches its items; `scanned_count` defaults to the same.
    #[must_use]
    pub fn new(items: Vec<Item>, last_evaluated_key: Option<ContinuationToken>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            last_evaluated_key,
            scanned_count: count,
        }
    }

    /// Whether another page may follow.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.is_some()
    }
}
