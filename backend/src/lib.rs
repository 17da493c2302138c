//! Backend library: digital tipping, reviews, and loyalty rewards for
//! restaurants.
//!
//! The crate is organised as a hexagon: `domain` holds the entities,
//! ports, and services; `outbound` the Diesel and filesystem adapters;
//! `api` the actix-web handlers; `server` the state assembly.

pub mod api;
pub mod doc;
pub mod domain;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-tracing middleware.
pub use middleware::Trace;
