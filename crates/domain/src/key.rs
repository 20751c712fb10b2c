//! Item keys: the attributes that identify an item within the table.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::item::Item;

/// Attribute holding the key in the simple schema.
pub const ID: &str = "id";
/// Partition key attribute in the composite schema.
pub const PK: &str = "pk";
/// Sort key attribute in the composite schema.
pub const SK: &str = "sk";

/// Sort key used when a path names only the partition.
pub const DEFAULT_SORT_KEY: &str = "default";

/// Which attributes form an item's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySchema {
    /// A single `id` attribute.
    Simple,
    /// A `pk` partition key plus an `sk` sort key.
    #[default]
    Composite,
}

impl KeySchema {
    /// Names of the key attributes, partition first.
    #[must_use]
    pub fn attribute_names(self) -> &'static [&'static str] {
        match self {
            Self::Simple => &[ID],
            Self::Composite => &[PK, SK],
        }
    }

    /// Key attributes that are absent, not strings, or empty.
    #[must_use]
    pub fn missing_fields(self, item: &Item) -> Vec<&'static str> {
        self.attribute_names()
            .iter()
            .copied()
            .filter(|name| item.get_str(name).is_none_or(str::is_empty))
            .collect()
    }

    /// Extract the key of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingKeyFields`] listing every absent
    /// key attribute.
    pub fn key_of(self, item: &Item) -> Result<ItemKey, ValidationError> {
        let missing = self.missing_fields(item);
        if !missing.is_empty() {
            return Err(ValidationError::MissingKeyFields(missing));
        }
        let text = |name: &str| item.get_str(name).unwrap_or_default().to_string();
        Ok(match self {
            Self::Simple => ItemKey::simple(text(ID)),
            Self::Composite => ItemKey::composite(text(PK), text(SK)),
        })
    }

    /// Build a key from the path segments following `/items/`.
    ///
    /// The composite schema falls back to [`DEFAULT_SORT_KEY`] when the sort
    /// segment is absent or empty. Returns `None` when the partition segment
    /// is missing or empty.
    #[must_use]
    pub fn key_from_segments(self, segments: &[&str]) -> Option<ItemKey> {
        let partition = segments.first().filter(|s| !s.is_empty())?;
        Some(match self {
            Self::Simple => ItemKey::simple(*partition),
            Self::Composite => {
                let sort = segments
                    .get(1)
                    .filter(|s| !s.is_empty())
                    .copied()
                    .unwrap_or(DEFAULT_SORT_KEY);
                ItemKey::composite(*partition, sort)
            }
        })
    }
}

/// The primary key of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    /// Key in the simple schema.
    Simple { id: String },
    /// Key in the composite schema.
    Composite { pk: String, sk: String },
}

impl ItemKey {
    #[must_use]
    pub fn simple(id: impl Into<String>) -> Self {
        Self::Simple { id: id.into() }
    }

    #[must_use]
    pub fn composite(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self::Composite {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Partition value (`id` or `pk`).
    #[must_use]
    pub fn partition(&self) -> &str {
        match self {
            Self::Simple { id } => id,
            Self::Composite { pk, .. } => pk,
        }
    }

    /// Sort value, if the schema has one.
    #[must_use]
    pub fn sort(&self) -> Option<&str> {
        match self {
            Self::Simple { .. } => None,
            Self::Composite { sk, .. } => Some(sk),
        }
    }

    /// `(attribute, value)` pairs, partition first.
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Simple { id } => vec![(ID, id.as_str())],
            Self::Composite { pk, sk } => vec![(PK, pk.as_str()), (SK, sk.as_str())],
        }
    }

    /// The key as a JSON object, the shape stores use for continuation tokens.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        self.attributes()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple { id } => f.write_str(id),
            Self::Composite { pk, sk } => write!(f, "{pk}#{sk}"),
        }
    }
}
