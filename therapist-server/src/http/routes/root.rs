//! Service banner

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::{API_TITLE, API_VERSION};

/// Root response
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: API_TITLE,
        version: API_VERSION,
        status: "running",
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}
