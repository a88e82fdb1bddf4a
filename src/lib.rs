//! Library crate for button-pong-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Storage backends and the persisted document.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers and handlers.
pub mod routes;
/// Operations behind the routes and the background ping manager.
pub mod services;
/// Game record, transitions and lease coordination.
pub mod state;
