//! # tablegate-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ItemStore` port defined in `tablegate-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between items and database rows (JSON documents keyed by
//!   partition and sort value)
//!
//! ## Dependency rule
//! Depends on `tablegate-app` (for the port trait) and `tablegate-domain`
//! (for domain types). The `app` and `domain` crates must never reference
//! this adapter.

mod error;
mod item_store;
mod pool;

pub use error::StorageError;
pub use item_store::SqliteItemStore;
pub use pool::{Config, Database};
