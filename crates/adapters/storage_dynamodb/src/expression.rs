//! Expression strings and placeholder maps for conditional requests.
//!
//! Attribute names always go through `#` placeholders so that reserved
//! words (`name`, `status`, ...) never reach the expression text.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use tablegate_domain::item::VERSION;
use tablegate_domain::key::ItemKey;
use tablegate_domain::query::{ComparisonOp, IndexQuery};
use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};

/// Primary key of `key` as attribute values.
pub(crate) fn key_map(key: &ItemKey) -> HashMap<String, AttributeValue> {
    key.attributes()
        .into_iter()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.to_string())))
        .collect()
}

fn number(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

/// Expressions and placeholders for one `UpdateItem` call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UpdateExpression {
    pub update: String,
    pub condition: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    /// `SET` every assignment, bump `version` and guard on `guard`.
    ///
    /// A stored item without `version` passes a guard expecting 0.
    pub(crate) fn build(
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> Result<Self, serde_dynamo::Error> {
        let mut names = HashMap::new();
        let mut values: HashMap<String, AttributeValue> = HashMap::new();
        let mut assignments = Vec::with_capacity(update.len() + 1);

        for (index, (name, value)) in update.fields().enumerate() {
            names.insert(format!("#f{index}"), name.to_string());
            values.insert(format!(":v{index}"), serde_dynamo::to_attribute_value(value)?);
            assignments.push(format!("#f{index} = :v{index}"));
        }

        names.insert("#version".to_string(), VERSION.to_string());
        values.insert(":zero".to_string(), number(0));
        values.insert(":one".to_string(), number(1));
        assignments.push("#version = if_not_exists(#version, :zero) + :one".to_string());

        let (partition, _) = key.attributes()[0];
        names.insert("#pk".to_string(), partition.to_string());
        let mut condition = "attribute_exists(#pk)".to_string();
        if let UpdateGuard::VersionEquals(expected) = guard {
            values.insert(":expected".to_string(), number(expected));
            if expected == 0 {
                condition.push_str(" AND (attribute_not_exists(#version) OR #version = :expected)");
            } else {
                condition.push_str(" AND #version = :expected");
            }
        }

        Ok(Self {
            update: format!("SET {}", assignments.join(", ")),
            condition,
            names,
            values,
        })
    }
}

/// Key condition for a secondary-index query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyCondition {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl KeyCondition {
    pub(crate) fn build(query: &IndexQuery) -> Self {
        let mut names = HashMap::from([("#ipk".to_string(), query.partition_attribute())]);
        let mut values = HashMap::from([(
            ":ipk".to_string(),
            AttributeValue::S(query.partition.clone()),
        )]);
        let mut expression = "#ipk = :ipk".to_string();

        if let Some(condition) = &query.sort {
            names.insert("#isk".to_string(), query.sort_attribute());
            values.insert(":isk".to_string(), AttributeValue::S(condition.value.clone()));
            let clause = match condition.op {
                ComparisonOp::BeginsWith => "begins_with(#isk, :isk)".to_string(),
                op => format!("#isk {op} :isk"),
            };
            expression.push_str(" AND ");
            expression.push_str(&clause);
        }

        Self {
            expression,
            names,
            values,
        }
    }
}
