//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`CrudError`]
//! via `#[from]`. Adapter failures cross the port boundary as
//! [`CrudError::Storage`].

use crate::batch::BatchItemErrors;
use crate::key::ItemKey;

/// Top-level error for every item use-case.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// The request violates a domain rule.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// No item is stored under the requested key.
    #[error("item not found")]
    NotFound(#[from] NotFoundError),

    /// A conditional write was rejected by the store.
    #[error("conflict")]
    Conflict(#[from] ConflictError),

    /// The backing store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain rule violations, all reported to callers as bad requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required key attributes are absent or empty.
    #[error("missing key attributes: {}", .0.join(", "))]
    MissingKeyFields(Vec<&'static str>),

    /// The payload is valid JSON but not an object.
    #[error("item must be a JSON object")]
    NotAnObject,

    /// The batch body has no usable `items` array.
    #[error("items array is required and must not be empty")]
    EmptyBatch,

    /// One or more items in a batch failed validation.
    #[error("{} batch item(s) failed validation", .0.len())]
    InvalidBatchItems(Vec<BatchItemErrors>),

    /// An index query lacks `gsi` or `pk`.
    #[error("gsi and pk parameters are required")]
    MissingQueryParameters,

    /// The `skCondition` token is not a supported operator.
    #[error("unsupported sort key condition `{0}`")]
    UnsupportedSortKeyCondition(String),

    /// The update tries to rewrite a key or creation attribute.
    #[error("{0} is immutable")]
    ImmutableField(String),

    /// The expected `version` is not a non-negative integer.
    #[error("version must be a non-negative integer")]
    InvalidVersion,

    /// The `lastKey` parameter is not a JSON object.
    #[error("lastKey must be a JSON-encoded object")]
    InvalidContinuationToken,
}

impl ValidationError {
    /// Per-field messages suitable for a `details` list, if any.
    #[must_use]
    pub fn field_messages(&self) -> Vec<String> {
        match self {
            Self::MissingKeyFields(fields) => {
                fields.iter().map(|f| format!("{f} is required")).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Lookup of a key that is not stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("item {key} not found")]
pub struct NotFoundError {
    pub key: ItemKey,
}

/// Rejected conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    /// A create found an item already stored under the key.
    #[error("item {0} already exists")]
    AlreadyExists(ItemKey),

    /// The stored `version` differs from the caller's.
    #[error("item {key} was modified concurrently (expected version {expected})")]
    VersionMismatch { key: ItemKey, expected: u64 },
}

/// Render an error and all of its sources as `outer: inner: root`.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
