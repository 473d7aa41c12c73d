//! therapist-server: HTTP front of the Therapist Office API
//!
//! Three stub endpoints (`/`, `/health`, `/api/info`) behind CORS and
//! request tracing. Domain routers (auth, patients, sessions, treatment
//! plans) plug into [`http::build_router`] as they are written.

pub mod cli;
pub mod http;
pub mod state;
pub mod tracing_setup;

pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError};
pub use state::AppState;

/// Service title reported by `/`
pub const API_TITLE: &str = "Therapist Office API";

/// API version reported by every endpoint
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const API_DESCRIPTION: &str = "HIPAA-compliant treatment planning application";
