//! # tablegate-adapter-http-gateway
//!
//! Driving adapter for API-Gateway-shaped invocations.
//!
//! ## Responsibilities
//! - Define the request and response **event types** exchanged with the
//!   invocation layer (`httpMethod`, `path`, `queryStringParameters`, ...)
//! - Route by method and path to the GET / POST / PUT / DELETE handlers
//! - Format every response as JSON with CORS headers
//! - Map [`tablegate_domain::error::CrudError`] and routing failures to
//!   status codes
//!
//! ## Dependency rule
//! Depends on `tablegate-domain` and `tablegate-app`. Knows nothing about
//! the transport that delivers events (Lambda runtime, axum, tests).

pub mod error;
pub mod event;
pub mod handlers;
pub mod response;
pub mod router;

#[cfg(test)]
mod test_support;

pub use event::{GatewayRequest, GatewayResponse};
pub use router::Router;
