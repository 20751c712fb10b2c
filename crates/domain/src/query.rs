//! Secondary-index queries.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Comparison applied to an index's sort attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    BeginsWith,
}

impl ComparisonOp {
    /// Token as written in a request and in a DynamoDB key condition.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::BeginsWith => "begins_with",
        }
    }

    /// Evaluate the operator on two strings, the way the store compares them.
    #[must_use]
    pub fn matches(self, stored: &str, operand: &str) -> bool {
        match self {
            Self::Eq => stored == operand,
            Self::Lt => stored < operand,
            Self::Le => stored <= operand,
            Self::Gt => stored > operand,
            Self::Ge => stored >= operand,
            Self::BeginsWith => stored.starts_with(operand),
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Self::Eq),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "begins_with" => Ok(Self::BeginsWith),
            other => Err(ValidationError::UnsupportedSortKeyCondition(
                other.to_string(),
            )),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Range condition on the index sort attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyCondition {
    pub op: ComparisonOp,
    pub value: String,
}

/// Lookup of items through a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    /// Index name.
    pub index: String,
    /// Value of the index partition attribute.
    pub partition: String,
    pub sort: Option<SortKeyCondition>,
}

impl IndexQuery {
    /// Build a query from raw request parameters.
    ///
    /// The sort condition applies only when both `sk` and `sk_condition` are
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingQueryParameters`] when `gsi` or `pk`
    /// is absent or empty, and
    /// [`ValidationError::UnsupportedSortKeyCondition`] for an unknown
    /// operator.
    pub fn from_params(
        gsi: Option<&str>,
        pk: Option<&str>,
        sk: Option<&str>,
        sk_condition: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (Some(index), Some(partition)) = (
            gsi.filter(|s| !s.is_empty()),
            pk.filter(|s| !s.is_empty()),
        ) else {
            return Err(ValidationError::MissingQueryParameters);
        };

        let sort = match (sk, sk_condition) {
            (Some(value), Some(op)) if !value.is_empty() && !op.is_empty() => {
                Some(SortKeyCondition {
                    op: op.parse()?,
                    value: value.to_string(),
                })
            }
            _ => None,
        };

        Ok(Self {
            index: index.to_string(),
            partition: partition.to_string(),
            sort,
        })
    }

    /// Name of the index partition attribute (`<index>pk`).
    #[must_use]
    pub fn partition_attribute(&self) -> String {
        format!("{}pk", self.index)
    }

    /// Name of the index sort attribute (`<index>sk`).
    #[must_use]
    pub fn sort_attribute(&self) -> String {
        format!("{}sk", self.index)
    }
}
