//! # tablegate-app
//!
//! Application layer: use-cases, runtime settings and **port definitions**.
//!
//! ## Responsibilities
//! - Define the **`ItemStore` port** that storage adapters implement
//!   (conditional create, guarded update, delete, scan, index query, batch
//!   put, connectivity probe)
//! - Define **`ServiceSettings`**: the deployment variant (key schema, scan
//!   limit, optimistic locking), table name, region and environment
//! - Define the **`ItemService`** use-cases driven by the HTTP adapters
//! - Orchestrate domain objects without knowing *how* persistence works
//!
//! ## Dependency rule
//! Depends on `tablegate-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
pub mod settings;
