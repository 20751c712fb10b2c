//! In-memory store used by the router and handler tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Bound;
use std::sync::Mutex;

use tablegate_app::ports::{CreateOutcome, ItemStore, UpdateOutcome};
use tablegate_app::services::ItemService;
use tablegate_app::settings::{Environment, ServiceSettings, Variant};
use tablegate_domain::batch::ChunkResult;
use tablegate_domain::error::CrudError;
use tablegate_domain::item::Item;
use tablegate_domain::key::{ItemKey, KeySchema};
use tablegate_domain::page::{ContinuationToken, Page, PageRequest};
use tablegate_domain::query::IndexQuery;
use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};

use crate::router::Router;

pub struct InMemoryItemStore {
    schema: KeySchema,
    items: Mutex<BTreeMap<ItemKey, Item>>,
    broken: bool,
    batch_calls: Mutex<usize>,
    failing_batch: Option<usize>,
}

impl InMemoryItemStore {
    pub fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            items: Mutex::new(BTreeMap::new()),
            broken: false,
            batch_calls: Mutex::new(0),
            failing_batch: None,
        }
    }

    /// A store whose `call`-th batch write (1-based) fails.
    pub fn failing_on_batch(schema: KeySchema, call: usize) -> Self {
        Self {
            failing_batch: Some(call),
            ..Self::new(schema)
        }
    }

    /// A store whose every call fails.
    pub fn broken(schema: KeySchema) -> Self {
        Self {
            broken: true,
            ..Self::new(schema)
        }
    }

    fn failure() -> CrudError {
        CrudError::Storage(Box::new(std::io::Error::other("table unavailable")))
    }

    fn check(&self) -> Result<(), CrudError> {
        if self.broken { Err(Self::failure()) } else { Ok(()) }
    }

    fn paginate<'a>(
        &self,
        candidates: impl Iterator<Item = &'a Item>,
        limit: Option<usize>,
    ) -> Page {
        let candidates: Vec<&Item> = candidates.collect();
        let limit = limit.unwrap_or(usize::MAX);
        let items: Vec<Item> = candidates.iter().take(limit).map(|i| (*i).clone()).collect();
        let token = if candidates.len() > items.len() {
            items.last().and_then(|item| self.schema.key_of(item).ok()).map(|key| {
                ContinuationToken::new(key.to_json())
            })
        } else {
            None
        };
        Page::new(items, token)
    }
}

impl ItemStore for InMemoryItemStore {
    fn get(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send {
        let result = self
            .check()
            .map(|()| self.items.lock().unwrap().get(key).cloned());
        async { result }
    }

    fn create(
        &self,
        key: &ItemKey,
        item: Item,
    ) -> impl Future<Output = Result<CreateOutcome, CrudError>> + Send {
        let result = self.check().map(|()| {
            let mut items = self.items.lock().unwrap();
            if items.contains_key(key) {
                CreateOutcome::AlreadyExists
            } else {
                items.insert(key.clone(), item);
                CreateOutcome::Created
            }
        });
        async { result }
    }

    fn update(
        &self,
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> impl Future<Output = Result<UpdateOutcome, CrudError>> + Send {
        let result = self.check().map(|()| {
            let mut items = self.items.lock().unwrap();
            let Some(current) = items.get(key) else {
                return UpdateOutcome::Missing;
            };
            if let UpdateGuard::VersionEquals(expected) = guard {
                if current.version().unwrap_or(0) != expected {
                    return UpdateOutcome::VersionMismatch;
                }
            }
            let next = update.apply(current);
            items.insert(key.clone(), next.clone());
            UpdateOutcome::Updated(next)
        });
        async { result }
    }

    fn delete(&self, key: &ItemKey) -> impl Future<Output = Result<Option<Item>, CrudError>> + Send {
        let result = self
            .check()
            .map(|()| self.items.lock().unwrap().remove(key));
        async { result }
    }

    fn scan(&self, page: PageRequest) -> impl Future<Output = Result<Page, CrudError>> + Send {
        let result = self.check().and_then(|()| {
            let lower = match page.start {
                Some(token) => Bound::Excluded(token.item_key(self.schema)?),
                None => Bound::Unbounded,
            };
            let items = self.items.lock().unwrap();
            Ok(self.paginate(
                items.range((lower, Bound::Unbounded)).map(|(_, item)| item),
                page.limit,
            ))
        });
        async { result }
    }

    fn query(
        &self,
        query: &IndexQuery,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page, CrudError>> + Send {
        let result = self.check().map(|()| {
            let partition = query.partition_attribute();
            let sort = query.sort_attribute();
            let items = self.items.lock().unwrap();
            let matching = items.values().filter(|item| {
                item.get_str(&partition) == Some(query.partition.as_str())
                    && query.sort.as_ref().is_none_or(|cond| {
                        item.get_str(&sort)
                            .is_some_and(|stored| cond.op.matches(stored, &cond.value))
                    })
            });
            self.paginate(matching, page.limit)
        });
        async { result }
    }

    fn batch_put(
        &self,
        items: &[Item],
    ) -> impl Future<Output = Result<ChunkResult, CrudError>> + Send {
        let result = self.check().and_then(|()| {
            let mut calls = self.batch_calls.lock().unwrap();
            *calls += 1;
            if self.failing_batch == Some(*calls) {
                return Err(Self::failure());
            }
            let mut stored = self.items.lock().unwrap();
            for item in items {
                if let Ok(key) = self.schema.key_of(item) {
                    stored.insert(key, item.clone());
                }
            }
            Ok(ChunkResult {
                items: items.len(),
                unprocessed_items: Vec::new(),
            })
        });
        async { result }
    }

    fn probe(&self) -> impl Future<Output = Result<(), CrudError>> + Send {
        let result = self.check();
        async { result }
    }
}

pub fn router(variant: Variant) -> Router<InMemoryItemStore> {
    router_with(InMemoryItemStore::new(variant.key_schema()), variant, "development")
}

pub fn router_with(
    store: InMemoryItemStore,
    variant: Variant,
    environment: &str,
) -> Router<InMemoryItemStore> {
    let settings =
        ServiceSettings::new(variant, "items-table").with_environment(Environment::new(environment));
    Router::new(ItemService::new(store, settings))
}
