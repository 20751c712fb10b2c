//! # tablegate-domain
//!
//! Pure domain model for the tablegate item API.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Items** (schema-less attribute maps with system metadata)
//! - Define **Keys** (simple `id` or composite `pk`/`sk`) and key validation
//! - Define **Field updates** (typed, allow-listed partial updates)
//! - Define **Pages** and **continuation tokens** for scans and queries
//! - Define **Index queries** with a closed set of sort-key operators
//! - Define **Batches** (all-or-nothing validation, fixed-size chunks)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod batch;
pub mod item;
pub mod key;
pub mod page;
pub mod query;
pub mod update;
