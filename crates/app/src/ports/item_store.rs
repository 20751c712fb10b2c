//! Item storage port: keyed reads and conditional writes on one table.

use std::future::Future;

use tablegate_domain::batch::ChunkResult;
use tablegate_domain::error::CrudError;
use tablegate_domain::item::Item;
use tablegate_domain::key::ItemKey;
use tablegate_domain::page::{Page, PageRequest};
use tablegate_domain::query::IndexQuery;
use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};

/// Result of a create guarded on key absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// An item is already stored under the key; nothing was written.
    AlreadyExists,
}

/// Result of a guarded update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The write was applied; carries the item after the update.
    Updated(Item),
    /// No item is stored under the key.
    Missing,
    /// The item exists but its version differs from the guard.
    VersionMismatch,
}

/// Persistence operations for items.
///
/// Every write is a single conditional operation on the store so that two
/// concurrent requests cannot both pass the same guard.
pub trait ItemStore {
    /// Fetch the item stored under `key`.
    fn get(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send;

    /// Store `item` under `key` only if no item exists there yet.
    fn create(
        &self,
        key: &ItemKey,
        item: Item,
    ) -> impl Future<Output = Result<CreateOutcome, CrudError>> + Send;

    /// Apply `update` to the item under `key` if `guard` holds.
    ///
    /// The store sets every assignment, increments `version` (a missing
    /// version counts as 0) and returns the full item after the write.
    fn update(
        &self,
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> impl Future<Output = Result<UpdateOutcome, CrudError>> + Send;

    /// Remove the item under `key`, returning it if it existed.
    fn delete(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send;

    /// Read items in key order, one page at a time.
    fn scan(&self, page: PageRequest) -> impl Future<Output = Result<Page, CrudError>> + Send;

    /// Read items through a secondary index.
    fn query(
        &self,
        query: &IndexQuery,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page, CrudError>> + Send;

    /// Write up to one chunk of items unconditionally.
    ///
    /// Items the store could not write are reported back instead of failing
    /// the call.
    fn batch_put(
        &self,
        items: &[Item],
    ) -> impl Future<Output = Result<ChunkResult, CrudError>> + Send;

    /// Cheap round-trip proving the store is reachable and the table exists.
    fn probe(&self) -> impl Future<Output = Result<(), CrudError>> + Send;
}

impl<T: ItemStore + Send + Sync> ItemStore for std::sync::Arc<T> {
    fn get(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send {
        (**self).get(key)
    }

    fn create(
        &self,
        key: &ItemKey,
        item: Item,
    ) -> impl Future<Output = Result<CreateOutcome, CrudError>> + Send {
        (**self).create(key, item)
    }

    fn update(
        &self,
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> impl Future<Output = Result<UpdateOutcome, CrudError>> + Send {
        (**self).update(key, update, guard)
    }

    fn delete(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send {
        (**self).delete(key)
    }

    fn scan(&self, page: PageRequest) -> impl Future<Output = Result<Page, CrudError>> + Send {
        (**self).scan(page)
    }

    fn query(
        &self,
        query: &IndexQuery,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page, CrudError>> + Send {
        (**self).query(query, page)
    }

    fn batch_put(
        &self,
        items: &[Item],
    ) -> impl Future<Output = Result<ChunkResult, CrudError>> + Send {
        (**self).batch_put(items)
    }

    fn probe(&self) -> impl Future<Output = Result<(), CrudError>> + Send {
        (**self).probe()
    }
}
