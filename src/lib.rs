//! Library crate for photo-contest-back, exposing modules for binaries and integration tests.

/// Deployment mode flags and API key configuration.
pub mod config;
/// Storage contract and backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routing.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state and the contest domain model.
pub mod state;
