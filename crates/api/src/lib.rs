//! Discover feed API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! discovery, lifecycle) so integration tests and the binary entrypoint can
//! both access them.

pub mod auth;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod usecase;
