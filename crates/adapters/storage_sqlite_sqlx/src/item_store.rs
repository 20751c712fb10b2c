//! `SQLite` implementation of [`ItemStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use tablegate_app::ports::{CreateOutcome, ItemStore, UpdateOutcome};
use tablegate_domain::batch::ChunkResult;
use tablegate_domain::error::CrudError;
use tablegate_domain::item::Item;
use tablegate_domain::key::{ItemKey, KeySchema};
use tablegate_domain::page::{ContinuationToken, Page, PageRequest};
use tablegate_domain::query::{ComparisonOp, IndexQuery};
use tablegate_domain::update::{FieldUpdateSet, UpdateGuard};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Item);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let document: String = row.try_get("document")?;
        let item = serde_json::from_str(&document).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(item))
    }
}

/// A stored item together with the version column guarding its row.
struct Versioned {
    item: Item,
    version: i64,
}

impl<'r> FromRow<'r, SqliteRow> for Versioned {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let Wrapper(item) = Wrapper::from_row(row)?;
        let version: i64 = row.try_get("version")?;
        Ok(Self { item, version })
    }
}

const SELECT_ONE: &str = "SELECT document, version FROM items WHERE partition = ? AND sort = ?";

const INSERT_NEW: &str = r"
    INSERT INTO items (partition, sort, document, version)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (partition, sort) DO NOTHING
";

const UPSERT: &str = r"
    INSERT INTO items (partition, sort, document, version)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (partition, sort) DO UPDATE
    SET document = excluded.document, version = excluded.version
";

const UPDATE_IF_VERSION: &str = r"
    UPDATE items
    SET document = ?, version = ?
    WHERE partition = ? AND sort = ? AND version = ?
";

const DELETE_RETURNING: &str =
    "DELETE FROM items WHERE partition = ? AND sort = ? RETURNING document";

const PROBE: &str = "SELECT 1 FROM items LIMIT 1";

/// `SQLite`-backed item store.
///
/// Items live in a single `items` table as JSON documents. The `version`
/// column mirrors the document's `version` attribute and serves as the
/// compare-and-swap guard for updates.
pub struct SqliteItemStore {
    pool: SqlitePool,
    schema: KeySchema,
}

impl SqliteItemStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool, schema: KeySchema) -> Self {
        Self { pool, schema }
    }

    /// Append `AND (partition, sort) > (..)` for a resumed read.
    fn push_resume_after(
        &self,
        builder: &mut QueryBuilder<'_, Sqlite>,
        start: Option<&ContinuationToken>,
    ) -> Result<(), CrudError> {
        if let Some(token) = start {
            let key = token.item_key(self.schema)?;
            let (partition, sort) = columns(&key);
            builder
                .push(" AND (partition, sort) > (")
                .push_bind(partition.to_string())
                .push(", ")
                .push_bind(sort.to_string())
                .push(")");
        }
        Ok(())
    }

    /// Run a page query that fetched one row past `limit` to detect more.
    async fn fetch_page(
        &self,
        mut builder: QueryBuilder<'_, Sqlite>,
        limit: Option<usize>,
    ) -> Result<Page, CrudError> {
        builder.push(" ORDER BY partition, sort");
        if let Some(limit) = limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX));
        }

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut items: Vec<Item> = rows.into_iter().map(|w| w.0).collect();
        let token = match limit {
            Some(limit) if items.len() > limit => {
                items.truncate(limit);
                items
                    .last()
                    .and_then(|item| self.schema.key_of(item).ok())
                    .map(|key| ContinuationToken::from(&key))
            }
            _ => None,
        };
        Ok(Page::new(items, token))
    }
}

fn columns(key: &ItemKey) -> (&str, &str) {
    (key.partition(), key.sort().unwrap_or_default())
}

fn version_column(item: &Item) -> i64 {
    i64::try_from(item.version().unwrap_or(0)).unwrap_or(i64::MAX)
}

/// `SQLite` JSON path selecting a top-level attribute.
fn json_path(attribute: &str) -> String {
    format!("$.\"{attribute}\"")
}

impl ItemStore for SqliteItemStore {
    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, CrudError> {
        let (partition, sort) = columns(key);
        let row: Option<Wrapper> = sqlx::query_as(SELECT_ONE)
            .bind(partition)
            .bind(sort)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn create(&self, key: &ItemKey, item: Item) -> Result<CreateOutcome, CrudError> {
        let (partition, sort) = columns(key);
        let document = serde_json::to_string(&item).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT_NEW)
            .bind(partition)
            .bind(sort)
            .bind(document)
            .bind(version_column(&item))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(if result.rows_affected() == 0 {
            CreateOutcome::AlreadyExists
        } else {
            CreateOutcome::Created
        })
    }

    async fn update(
        &self,
        key: &ItemKey,
        update: &FieldUpdateSet,
        guard: UpdateGuard,
    ) -> Result<UpdateOutcome, CrudError> {
        let (partition, sort) = columns(key);

        loop {
            let current: Option<Versioned> = sqlx::query_as(SELECT_ONE)
                .bind(partition)
                .bind(sort)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
            let Some(current) = current else {
                return Ok(UpdateOutcome::Missing);
            };
            if let UpdateGuard::VersionEquals(expected) = guard {
                if current.item.version().unwrap_or(0) != expected {
                    return Ok(UpdateOutcome::VersionMismatch);
                }
            }

            let next = update.apply(&current.item);
            let document = serde_json::to_string(&next).map_err(StorageError::from)?;
            let result = sqlx::query(UPDATE_IF_VERSION)
                .bind(document)
                .bind(version_column(&next))
                .bind(partition)
                .bind(sort)
                .bind(current.version)
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 1 {
                return Ok(UpdateOutcome::Updated(next));
            }
            tracing::debug!(%key, "row changed between read and write, re-reading");
        }
    }

    async fn delete(&self, key: &ItemKey) -> Result<Option<Item>, CrudError> {
        let (partition, sort) = columns(key);
        let row: Option<Wrapper> = sqlx::query_as(DELETE_RETURNING)
            .bind(partition)
            .bind(sort)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn scan(&self, page: PageRequest) -> Result<Page, CrudError> {
        let mut builder = QueryBuilder::new("SELECT document FROM items WHERE 1 = 1");
        self.push_resume_after(&mut builder, page.start.as_ref())?;
        self.fetch_page(builder, page.limit).await
    }

    async fn query(&self, query: &IndexQuery, page: PageRequest) -> Result<Page, CrudError> {
        let mut builder = QueryBuilder::new("SELECT document FROM items WHERE json_extract(document, ");
        builder
            .push_bind(json_path(&query.partition_attribute()))
            .push(") = ")
            .push_bind(query.partition.clone());

        if let Some(condition) = &query.sort {
            let sort_path = json_path(&query.sort_attribute());
            match condition.op {
                ComparisonOp::BeginsWith => {
                    builder
                        .push(" AND substr(json_extract(document, ")
                        .push_bind(sort_path)
                        .push("), 1, length(")
                        .push_bind(condition.value.clone())
                        .push(")) = ")
                        .push_bind(condition.value.clone());
                }
                op => {
                    builder
                        .push(" AND json_extract(document, ")
                        .push_bind(sort_path)
                        .push(") ")
                        .push(op.as_str())
                        .push(" ")
                        .push_bind(condition.value.clone());
                }
            }
        }

        self.push_resume_after(&mut builder, page.start.as_ref())?;
        self.fetch_page(builder, page.limit).await
    }

    async fn batch_put(&self, items: &[Item]) -> Result<ChunkResult, CrudError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for item in items {
            let key = self.schema.key_of(item)?;
            let (partition, sort) = columns(&key);
            let document = serde_json::to_string(item).map_err(StorageError::from)?;
            sqlx::query(UPSERT)
                .bind(partition)
                .bind(sort)
                .bind(document)
                .bind(version_column(item))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;

        Ok(ChunkResult {
            items: items.len(),
            unprocessed_items: Vec::new(),
        })
    }

    async fn probe(&self) -> Result<(), CrudError> {
        sqlx::query(PROBE)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
