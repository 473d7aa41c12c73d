//! API information endpoint. Never touches the database.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::API_VERSION;

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub app_name: String,
    pub version: &'static str,
    pub database_host: String,
    pub oci_region: String,
}

/// GET /api/info
async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let settings = state.settings();
    Json(InfoResponse {
        app_name: settings.app.name.clone(),
        version: API_VERSION,
        database_host: settings.database.host.clone(),
        oci_region: settings.oci.region.clone(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/info", get(info))
}
