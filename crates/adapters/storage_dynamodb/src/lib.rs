//! # tablegate-adapter-storage-dynamodb
//!
//! `DynamoDB` implementation of the [`ItemStore`](tablegate_app::ports::ItemStore) port.
//!
//! Every write is a single conditional request: creates are guarded on key
//! absence, updates on existence and optionally on the stored `version`.
//! Attribute values are converted with `serde_dynamo`.

mod config;
mod error;
mod expression;
mod item_store;

pub use config::DynamoDbConfig;
pub use error::StorageError;
pub use item_store::DynamoDbItemStore;
