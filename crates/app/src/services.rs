//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod health;
pub mod item_service;

pub use health::{HealthReport, HealthStatus};
pub use item_service::ItemService;
