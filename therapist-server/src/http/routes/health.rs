//! Health check endpoint
//!
//! Checks out a scoped session and runs a trivial query under the pool's
//! short check deadline. Any failure (unreachable, pool exhausted, too
//! slow) becomes a 503.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::ApiError;
use crate::state::AppState;
use crate::API_VERSION;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.sessions().check().await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "connected",
        version: API_VERSION,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
