//! # tablegate-adapter-http-axum
//!
//! Driving adapter that serves the item API over HTTP with axum.
//!
//! ## Responsibilities
//! - Translate incoming HTTP requests into gateway request events
//! - Hand them to the shared gateway [`Router`](tablegate_adapter_http_gateway::Router)
//! - Translate gateway responses back into HTTP responses
//! - Trace every request with `tower-http`
//!
//! ## Dependency rule
//! Depends on `tablegate-app` and the gateway adapter. Routing, validation
//! and error mapping all live in the gateway router; this crate only moves
//! bytes between the two request shapes.

pub mod bridge;
pub mod router;
