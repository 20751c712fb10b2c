//! Typed partial updates.
//!
//! A PUT body is turned into a [`FieldUpdateSet`] before it reaches a store:
//! system attributes are stripped, key attributes are checked against the
//! addressed key, and the caller's `version` becomes the expected version.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValidationError;
use crate::item::{CREATED_AT, Item, UPDATED_AT, VERSION};
use crate::key::ItemKey;
use crate::time::{Timestamp, to_iso8601};

/// Write condition attached to an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateGuard {
    /// The item must exist.
    Exists,
    /// The item must exist and its stored `version` must equal this value.
    VersionEquals(u64),
}

/// Validated set of attribute assignments plus the version bump.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdateSet {
    fields: BTreeMap<String, Value>,
    expected_version: u64,
}

impl FieldUpdateSet {
    /// Build an update set from a request body addressed at `key`.
    ///
    /// - `version` is removed and read as the expected version (absent or
    ///   `null` means 0).
    /// - `created_at` and `updated_at` are system-managed and dropped; the
    ///   update always sets `updated_at` to `ts`.
    /// - key attributes may only repeat the addressed key's value; they are
    ///   dropped from the assignments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] when `body` is not an object,
    /// [`ValidationError::InvalidVersion`] when `version` is not a
    /// non-negative integer, and [`ValidationError::ImmutableField`] when a
    /// key attribute names a different key.
    pub fn parse(body: Value, key: &ItemKey, ts: Timestamp) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = body else {
            return Err(ValidationError::NotAnObject);
        };

        let expected_version = match map.remove(VERSION) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_u64().ok_or(ValidationError::InvalidVersion)?,
        };

        for (name, value) in key.attributes() {
            if let Some(given) = map.remove(name) {
                if given.as_str() != Some(value) {
                    return Err(ValidationError::ImmutableField(name.to_string()));
                }
            }
        }

        map.remove(CREATED_AT);
        map.remove(UPDATED_AT);

        let mut fields: BTreeMap<String, Value> = map.into_iter().collect();
        fields.insert(UPDATED_AT.to_string(), Value::String(to_iso8601(ts)));

        Ok(Self {
            fields,
            expected_version,
        })
    }

    /// Attribute assignments, ordered by name. Always includes `updated_at`.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of assignments, `updated_at` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`: every update stamps `updated_at`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Version the caller believes is stored.
    #[must_use]
    pub fn expected_version(&self) -> u64 {
        self.expected_version
    }

    /// Guard to attach to the write.
    #[must_use]
    pub fn guard(&self, check_version: bool) -> UpdateGuard {
        if check_version {
            UpdateGuard::VersionEquals(self.expected_version)
        } else {
            UpdateGuard::Exists
        }
    }

    /// Apply the assignments and the version bump to `current`.
    ///
    /// Stores without server-side update expressions use this to compute the
    /// new item. A missing `version` counts as 0.
    #[must_use]
    pub fn apply(&self, current: &Item) -> Item {
        let mut next = current.clone();
        for (name, value) in &self.fields {
            next.insert(name.clone(), value.clone());
        }
        next.insert(VERSION, current.version().unwrap_or(0) + 1);
        next
    }
}
