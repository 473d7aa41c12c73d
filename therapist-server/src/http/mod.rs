//! HTTP server layer
//!
//! Axum server with:
//! - CORS from `CORS_ORIGINS` (credentials allowed)
//! - Request tracing
//! - Panics converted to 500s
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, cors_layer, run_server, ServerConfig, ServerError};
