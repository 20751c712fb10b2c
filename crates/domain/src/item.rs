//! Items: schema-less attribute map stored in the table.
//!
//! Besides its key attributes an item is free-form. The system maintains
//! three attributes of its own: [`CREATED_AT`], [`UPDATED_AT`] and
//! [`VERSION`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::time::{Timestamp, to_iso8601};

/// Creation timestamp, written once.
pub const CREATED_AT: &str = "created_at";
/// Timestamp of the latest mutation.
pub const UPDATED_AT: &str = "updated_at";
/// Optimistic-concurrency counter.
pub const VERSION: &str = "version";

/// Version assigned to freshly created items.
pub const INITIAL_VERSION: u64 = 1;

/// A single stored item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// An item with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept any JSON value that is an object.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] for arrays, scalars and `null`.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    /// Chainable attribute setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String attribute, if present and a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Current version, or `None` when the attribute is absent or not an
    /// unsigned integer.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.0.get(VERSION).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        self.get_str(CREATED_AT)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT)
    }

    /// Stamp creation metadata: both timestamps set to `ts`, version reset.
    pub fn stamp_created(&mut self, ts: Timestamp) {
        let stamp = to_iso8601(ts);
        self.insert(CREATED_AT, stamp.clone());
        self.insert(UPDATED_AT, stamp);
        self.insert(VERSION, INITIAL_VERSION);
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

impl From<Map<String, Value>> for Item {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
