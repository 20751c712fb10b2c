//! Storage-specific error type wrapping sqlx errors.

use tablegate_domain::error::CrudError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be encoded or decoded.
    #[error("JSON document error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for CrudError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
