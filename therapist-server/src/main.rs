use anyhow::{Context, Result};
use clap::Parser;
use therapist_core::{SessionProvider, Settings};
use therapist_server::cli::ServerArgs;
use therapist_server::tracing_setup::{self, TracingConfig};
use therapist_server::{run_server, AppState, API_DESCRIPTION, API_VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    // Settings errors are fatal before anything binds
    let settings = Settings::load(args.env_file.as_deref()).context("failed to load settings")?;

    let _telemetry = tracing_setup::init(&TracingConfig {
        debug: settings.app.debug,
        otel: args.otel,
        service_name: settings.app.name.clone(),
    })?;

    tracing::info!(
        app = %settings.app.name,
        version = API_VERSION,
        debug = settings.app.debug,
        "{}",
        API_DESCRIPTION
    );

    let sessions = SessionProvider::initialize(&settings.database, settings.app.debug);
    let state = AppState::new(settings, sessions);

    // Spans are flushed when `_telemetry` drops after this returns
    run_server(state, args.server_config())
        .await
        .context("server error")
}
