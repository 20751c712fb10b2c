//! Batch creation with all-or-nothing validation, fixed-size write chunks.

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::item::Item;
use crate::key::KeySchema;
use crate::time::Timestamp;

/// Largest number of items a single batch write may carry.
pub const MAX_CHUNK_SIZE: usize = 25;

/// Validation failures of one batch entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemErrors {
    /// Position of the entry in the request's `items` array.
    pub index: usize,
    pub errors: Vec<String>,
}

/// A validated batch of new items.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    items: Vec<Item>,
}

impl Batch {
    /// Validate a `{ "items": [...] }` body.
    ///
    /// Every entry is checked; the batch is rejected as a whole if any entry
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyBatch`] when `items` is missing, not
    /// an array, or empty, and [`ValidationError::InvalidBatchItems`] with
    /// one record per failing entry otherwise.
    pub fn parse(body: Value, schema: KeySchema) -> Result<Self, ValidationError> {
        let entries = match body {
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(entries)) if !entries.is_empty() => entries,
                _ => return Err(ValidationError::EmptyBatch),
            },
            _ => return Err(ValidationError::EmptyBatch),
        };

        let mut items = Vec::with_capacity(entries.len());
        let mut failures = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match Item::from_value(entry) {
                Ok(item) => {
                    let errors = ValidationError::MissingKeyFields(schema.missing_fields(&item))
                        .field_messages();
                    if errors.is_empty() {
                        items.push(item);
                    } else {
                        failures.push(BatchItemErrors { index, errors });
                    }
                }
                Err(err) => failures.push(BatchItemErrors {
                    index,
                    errors: vec![err.to_string()],
                }),
            }
        }

        if failures.is_empty() {
            Ok(Self { items })
        } else {
            Err(ValidationError::InvalidBatchItems(failures))
        }
    }

    /// Stamp every item with the same creation instant.
    pub fn stamp_created(&mut self, ts: Timestamp) {
        for item in &mut self.items {
            item.stamp_created(ts);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false` for a parsed batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consecutive chunks of at most [`MAX_CHUNK_SIZE`] items.
    pub fn chunks(&self) -> impl Iterator<Item = &[Item]> {
        self.items.chunks(MAX_CHUNK_SIZE)
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// Outcome of writing one chunk, as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResult {
    /// Items submitted in the chunk.
    pub items: usize,
    /// Items the store did not write; returned to the caller as-is.
    pub unprocessed_items: Vec<Item>,
}

/// Summary of a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed_items: usize,
    pub results: Vec<ChunkResult>,
}
