//! Command-line arguments for the server binary

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::http::ServerConfig;

/// Therapist Office API server
#[derive(Parser, Debug, Clone)]
#[command(name = "therapist-api", version, about)]
pub struct ServerArgs {
    /// Bind address
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Env file to load before reading settings (default: ./.env if present)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Export traces over OTLP
    #[arg(long)]
    pub otel: bool,
}

impl ServerArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
        }
    }
}
