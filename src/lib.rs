//! Library crate for arcade-board-back, exposing modules for binaries and tests.

pub mod config;
/// Persistence: player store backends and photo files.
pub mod dao;
/// Wire payloads of the REST API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers and handlers.
pub mod routes;
/// Business operations used by the handlers.
pub mod services;
/// Shared application state and visitor sessions.
pub mod state;
