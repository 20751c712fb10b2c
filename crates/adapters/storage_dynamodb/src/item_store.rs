//! `DynamoDB` implementation of [`ItemStore`].

use std::collections::HashMap;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeValue, PutRequest, ReturnValue, ReturnValuesOnConditionCheckFailure, WriteRequest,
};
use serde_json::{Map, Value};

use tablegate_app::ports::{CreateOutcome, ItemStore, UpdateOutcome};
use tablegate_domain::batch::ChunkResult;
use tablegate_domain::error::CrudError;
use tablegate_domain::item::Item;
use tablegate_domain::key::{ItemKey, KeySchema};
use tablegate_domain::page::{ContinuationToken, Page, PageRequest};
use tablegate_domain::query::IndexQuery;
use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};

use crate::config::DynamoDbConfig;
use crate::error::StorageError;
use crate::expression::{KeyCondition, UpdateExpression, key_map};

type AttributeMap = HashMap<String, AttributeValue>;

/// `DynamoDB`-backed item store for a single table.
#[derive(Clone)]
pub struct DynamoDbItemStore {
    client: Client,
    table_name: String,
    schema: KeySchema,
}

impl std::fmt::Debug for DynamoDbItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbItemStore")
            .field("table_name", &self.table_name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl DynamoDbItemStore {
    /// Create a store from a pre-built client.
    #[must_use]
    pub fn new(client: Client, table_name: impl Into<String>, schema: KeySchema) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            schema,
        }
    }

    /// Build the client from the shared SDK config and the table settings.
    #[must_use]
    pub fn from_config(
        sdk_config: &aws_config::SdkConfig,
        config: &DynamoDbConfig,
        schema: KeySchema,
    ) -> Self {
        Self::new(config.client(sdk_config), config.table_name.clone(), schema)
    }
}

fn to_attributes(map: &Map<String, Value>) -> Result<AttributeMap, StorageError> {
    Ok(serde_dynamo::to_item(map)?)
}

fn to_item(attributes: AttributeMap) -> Result<Item, StorageError> {
    Ok(serde_dynamo::from_item(attributes)?)
}

fn to_page(
    items: Option<Vec<AttributeMap>>,
    last_evaluated_key: Option<AttributeMap>,
    scanned_count: i32,
) -> Result<Page, StorageError> {
    let items: Vec<Item> = serde_dynamo::from_items(items.unwrap_or_default())?;
    let token = match last_evaluated_key {
        Some(key) if !key.is_empty() => {
            Some(ContinuationToken::new(serde_dynamo::from_item(key)?))
        }
        _ => None,
    };
    let mut page = Page::new(items, token);
    page.scanned_count = usize::try_from(scanned_count).unwrap_or(page.count);
    Ok(page)
}

/// Items of the put requests `DynamoDB` handed back for `table_name`.
fn unprocessed_items(
    unprocessed: Option<HashMap<String, Vec<WriteRequest>>>,
    table_name: &str,
) -> Result<Vec<Item>, StorageError> {
    unprocessed
        .and_then(|mut tables| tables.remove(table_name))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|request| request.put_request)
        .map(|put| to_item(put.item))
        .collect()
}

impl ItemStore for DynamoDbItemStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, CrudError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_map(key)))
            .send()
            .await
            .map_err(StorageError::sdk)?;

        Ok(output.item.map(to_item).transpose()?)
    }

    async fn create(&self, key: &ItemKey, item: Item) -> Result<CreateOutcome, CrudError> {
        let (partition, _) = key.attributes()[0];
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_attributes(item.as_map())?))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", partition)
            .send()
            .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(PutItemError::is_conditional_check_failed_exception) =>
            {
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(err) => Err(StorageError::sdk(err).into()),
        }
    }

    async fn update(
        &self,
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> Result<UpdateOutcome, CrudError> {
        let expression = UpdateExpression::build(key, update, guard).map_err(StorageError::from)?;
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_map(key)))
            .update_expression(expression.update)
            .condition_expression(expression.condition)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => Ok(UpdateOutcome::Updated(to_item(
                output.attributes.unwrap_or_default(),
            )?)),
            Err(err) => match err.as_service_error() {
                // The old image is only returned when the item exists.
                Some(UpdateItemError::ConditionalCheckFailedException(failure)) => {
                    Ok(if failure.item().is_some() {
                        UpdateOutcome::VersionMismatch
                    } else {
                        UpdateOutcome::Missing
                    })
                }
                _ => Err(StorageError::sdk(err).into()),
            },
        }
    }

    async fn delete(&self, key: &ItemKey) -> Result<Option<Item>, CrudError> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_map(key)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(StorageError::sdk)?;

        Ok(output
            .attributes
            .filter(|attributes| !attributes.is_empty())
            .map(to_item)
            .transpose()?)
    }

    async fn scan(&self, page: PageRequest) -> Result<Page, CrudError> {
        let start = match &page.start {
            Some(token) => {
                let key = token.item_key(self.schema)?;
                Some(key_map(&key))
            }
            None => None,
        };

        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_limit(page.limit.and_then(|limit| i32::try_from(limit).ok()))
            .set_exclusive_start_key(start)
            .send()
            .await
            .map_err(StorageError::sdk)?;

        Ok(to_page(
            output.items,
            output.last_evaluated_key,
            output.scanned_count,
        )?)
    }

    async fn query(&self, query: &IndexQuery, page: PageRequest) -> Result<Page, CrudError> {
        let condition = KeyCondition::build(query);
        let start = page
            .start
            .as_ref()
            .map(|token| to_attributes(token.as_map()))
            .transpose()?;

        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(&query.index)
            .key_condition_expression(condition.expression)
            .set_expression_attribute_names(Some(condition.names))
            .set_expression_attribute_values(Some(condition.values))
            .set_limit(page.limit.and_then(|limit| i32::try_from(limit).ok()))
            .set_exclusive_start_key(start)
            .send()
            .await
            .map_err(StorageError::sdk)?;

        Ok(to_page(
            output.items,
            output.last_evaluated_key,
            output.scanned_count,
        )?)
    }

    async fn batch_put(&self, items: &[Item]) -> Result<ChunkResult, CrudError> {
        let requests = items
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_attributes(item.as_map())?))
                    .build()?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(StorageError::sdk)?;

        let unprocessed_items = unprocessed_items(output.unprocessed_items, &self.table_name)?;
        if !unprocessed_items.is_empty() {
            tracing::warn!(
                table_name = %self.table_name,
                unprocessed = unprocessed_items.len(),
                "batch write left items unprocessed"
            );
        }

        Ok(ChunkResult {
            items: items.len(),
            unprocessed_items,
        })
    }

    async fn probe(&self) -> Result<(), CrudError> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(StorageError::sdk)?;
        Ok(())
    }
}
