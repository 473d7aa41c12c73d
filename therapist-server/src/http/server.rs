//! Axum server setup
//!
//! Server skeleton with:
//! - CORS restricted to the configured origins
//! - Tracing middleware
//! - Startup database check (log-only, before the listener binds)
//! - Graceful shutdown on SIGTERM/Ctrl+C, then pool close

use std::any::Any;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::error::ApiError;
use super::routes;
use crate::state::AppState;
use crate::API_TITLE;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
}

/// CORS policy for the configured origins.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight rather than wildcarded. A `*` origin switches to any-origin
/// without credentials.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ServerError> {
    if origins.iter().any(|origin| origin == "*") {
        warn!("CORS: wildcard origin configured - credentials disabled");
        return Ok(CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any));
    }

    let allowed = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ServerError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the application router with all routes.
///
/// # Errors
///
/// Fails if a configured CORS origin is not a valid header value.
pub fn build_router(state: AppState) -> Result<Router, ServerError> {
    let cors = cors_layer(&state.settings().app.cors_origins)?;

    let routes = Router::new()
        .merge(routes::root::router())
        .merge(routes::health::router())
        .merge(routes::info::router())
        .fallback(not_found);

    Ok(with_middleware(routes, cors).with_state(state))
}

/// Outermost last: tracing, then CORS, then panic recovery. CORS sits
/// outside panic recovery so a 500 from a panic still carries the
/// allow-origin header.
fn with_middleware<S>(routes: Router<S>, cors: CorsLayer) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::Internal { message }.into_response()
}

/// Probe the database once. A failure is logged and startup continues;
/// `/health` keeps reporting 503 until the database is reachable.
pub async fn startup_check(state: &AppState) -> bool {
    info!("Starting {}...", API_TITLE);
    let connected = state.sessions().probe().await;
    if connected {
        info!(database = %state.sessions().target(), "Database connection verified");
    } else {
        error!(
            database = %state.sessions().target(),
            "Database connection failed! Continuing without it"
        );
    }
    connected
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let sessions = SessionProvider::initialize(&settings.database, settings.app.debug);
/// let state = AppState::new(settings, sessions);
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state.clone())?;

    // Bounded by the pool's check deadline, so it cannot stall startup
    startup_check(&state).await;

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.sessions().close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting shutdown");
        }
    }
}
