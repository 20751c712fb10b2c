//! Item service: the use-cases behind every route of the API.

use serde_json::Value;
use tablegate_domain::batch::{Batch, BatchReport};
use tablegate_domain::error::{ConflictError, CrudError, NotFoundError, error_chain};
use tablegate_domain::item::Item;
use tablegate_domain::key::{ItemKey, KeySchema};
use tablegate_domain::page::{ContinuationToken, Page, PageRequest};
use tablegate_domain::query::IndexQuery;
use tablegate_domain::time::{now, to_iso8601};
use tablegate_domain::update::FieldUpdateSet;

use crate::ports::{CreateOutcome, ItemStore, UpdateOutcome};
use crate::services::health::HealthReport;
use crate::settings::ServiceSettings;

/// Application service for item CRUD, index queries and batch writes.
pub struct ItemService<S> {
    store: S,
    settings: ServiceSettings,
}

impl<S: ItemStore> ItemService<S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    #[must_use]
    pub fn key_schema(&self) -> KeySchema {
        self.settings.key_schema()
    }

    /// Validate, stamp and store a new item.
    ///
    /// The item gets `created_at == updated_at` and `version == 1`, and is
    /// only written if its key is free.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] when `body` is not an object or
    /// lacks key attributes, [`CrudError::Conflict`] when the key is taken,
    /// or a storage error from the store.
    #[tracing::instrument(skip(self, body))]
    pub async fn create_item(&self, body: Value) -> Result<Item, CrudError> {
        let mut item = Item::from_value(body)?;
        let key = self.key_schema().key_of(&item)?;
        item.stamp_created(now());

        match self.store.create(&key, item.clone()).await? {
            CreateOutcome::Created => {
                tracing::info!(%key, "item created");
                Ok(item)
            }
            CreateOutcome::AlreadyExists => Err(ConflictError::AlreadyExists(key).into()),
        }
    }

    /// Look up an item by key, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::NotFound`] when no item is stored under `key`,
    /// or a storage error from the store.
    #[tracing::instrument(skip(self, key), fields(%key))]
    pub async fn get_item(&self, key: &ItemKey) -> Result<Item, CrudError> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| NotFoundError { key: key.clone() }.into())
    }

    /// Scan one page of items, resuming after `start` when given.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the store.
    #[tracing::instrument(skip(self, start))]
    pub async fn list_items(&self, start: Option<ContinuationToken>) -> Result<Page, CrudError> {
        let request = PageRequest::new(self.settings.variant.scan_limit(), start);
        self.store.scan(request).await
    }

    /// Read items through a secondary index.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the store.
    #[tracing::instrument(skip(self, query, start), fields(index = %query.index))]
    pub async fn query_items(
        &self,
        query: &IndexQuery,
        start: Option<ContinuationToken>,
    ) -> Result<Page, CrudError> {
        self.store.query(query, PageRequest::new(None, start)).await
    }

    /// Apply a partial update to an existing item.
    ///
    /// In the `advanced` variant the caller's `version` must match the stored
    /// one; the other variants only require the item to exist.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] for a malformed update body,
    /// [`CrudError::NotFound`] when the item does not exist,
    /// [`CrudError::Conflict`] on a version mismatch, or a storage error.
    #[tracing::instrument(skip(self, key, body), fields(%key))]
    pub async fn update_item(&self, key: &ItemKey, body: Value) -> Result<Item, CrudError> {
        let update = FieldUpdateSet::parse(body, key, now())?;
        let guard = update.guard(self.settings.variant.checks_version());

        match self.store.update(key, &update, guard).await? {
            UpdateOutcome::Updated(item) => {
                tracing::info!(%key, version = item.version(), "item updated");
                Ok(item)
            }
            UpdateOutcome::Missing => Err(NotFoundError { key: key.clone() }.into()),
            UpdateOutcome::VersionMismatch => Err(ConflictError::VersionMismatch {
                key: key.clone(),
                expected: update.expected_version(),
            }
            .into()),
        }
    }

    /// Delete an item, returning its last stored state.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::NotFound`] when nothing was deleted, or a storage
    /// error from the store.
    #[tracing::instrument(skip(self, key), fields(%key))]
    pub async fn delete_item(&self, key: &ItemKey) -> Result<Item, CrudError> {
        let deleted = self
            .store
            .delete(key)
            .await?
            .ok_or_else(|| NotFoundError { key: key.clone() })?;
        tracing::info!(%key, "item deleted");
        Ok(deleted)
    }

    /// Validate a batch body and write it chunk by chunk.
    ///
    /// Nothing is written unless every item is valid. Chunks are written in
    /// order; a store failure aborts the remaining chunks and leaves earlier
    /// ones in place.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] when the batch is empty or any item
    /// is invalid, or a storage error from the store.
    #[tracing::instrument(skip(self, body))]
    pub async fn create_batch(&self, body: Value) -> Result<BatchReport, CrudError> {
        let mut batch = Batch::parse(body, self.key_schema())?;
        batch.stamp_created(now());

        let mut results = Vec::new();
        for chunk in batch.chunks() {
            let result = self.store.batch_put(chunk).await?;
            if !result.unprocessed_items.is_empty() {
                tracing::warn!(
                    unprocessed = result.unprocessed_items.len(),
                    "store left items unprocessed"
                );
            }
            results.push(result);
        }

        tracing::info!(items = batch.len(), chunks = results.len(), "batch written");
        Ok(BatchReport {
            processed_items: batch.len(),
            results,
        })
    }

    /// Probe the store and describe the deployment.
    ///
    /// Never fails: a probe error degrades the report instead.
    #[tracing::instrument(skip(self))]
    pub async fn check_health(&self) -> HealthReport {
        let probe_error = match self.store.probe().await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %error_chain(&err), "store probe failed");
                Some(error_chain(&err))
            }
        };
        HealthReport::new(&self.settings, to_iso8601(now()), probe_error)
    }

    /// Probe the store, surfacing the failure.
    ///
    /// # Errors
    ///
    /// Returns the storage error raised by the probe.
    #[tracing::instrument(skip(self))]
    pub async fn check_connectivity(&self) -> Result<(), CrudError> {
        self.store.probe().await
    }
}
