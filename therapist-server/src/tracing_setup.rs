//! Log output for the API server, plus optional OTLP span export.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the settings
//! `DEBUG` flag. With `--otel` (and the `telemetry` feature) spans are also
//! shipped to `OTEL_EXPORTER_OTLP_ENDPOINT`, tagged with the configured
//! `APP_NAME` as `service.name`.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// What the subscriber should emit
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Settings `DEBUG` flag: debug level unless RUST_LOG is set
    pub debug: bool,
    /// Export spans over OTLP (needs the `telemetry` feature)
    pub otel: bool,
    /// Reported as `service.name` on exported spans
    pub service_name: String,
}

impl TracingConfig {
    fn filter(&self) -> EnvFilter {
        let default = if self.debug { "debug" } else { "info" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

/// Keeps the span exporter alive. Dropping it flushes pending spans, so
/// hold it until the server has shut down.
#[must_use = "dropping the guard stops span export"]
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    pub fn is_exporting(&self) -> bool {
        #[cfg(feature = "telemetry")]
        let exporting = self.provider.is_some();
        #[cfg(not(feature = "telemetry"))]
        let exporting = false;
        exporting
    }
}

#[cfg(feature = "telemetry")]
impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "Failed to flush spans");
            }
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the OTLP exporter
/// cannot be built.
pub fn init(config: &TracingConfig) -> Result<TelemetryGuard> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let registry = tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer);

    #[cfg(feature = "telemetry")]
    let guard = {
        use opentelemetry::trace::TracerProvider as _;

        let provider = if config.otel {
            Some(otlp::provider(&config.service_name)?)
        } else {
            None
        };
        let otel_layer = provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
        });

        registry
            .with(otel_layer)
            .try_init()
            .map_err(|err| anyhow!(err))?;

        if provider.is_some() {
            tracing::info!(service = %config.service_name, "OTLP span export enabled");
        }
        TelemetryGuard { provider }
    };

    #[cfg(not(feature = "telemetry"))]
    let guard = {
        registry.try_init().map_err(|err| anyhow!(err))?;

        if config.otel {
            tracing::warn!("--otel ignored: built without the `telemetry` feature");
        }
        TelemetryGuard::default()
    };

    Ok(guard)
}

#[cfg(feature = "telemetry")]
mod otlp {
    use anyhow::{anyhow, Result};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::trace::TracerProvider;
    use opentelemetry_sdk::{runtime, Resource};

    use crate::API_VERSION;

    /// Batch exporter over gRPC; the endpoint is read from the standard
    /// OTEL_EXPORTER_OTLP_* variables.
    pub(super) fn provider(service_name: &str) -> Result<TracerProvider> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .map_err(|e| anyhow!("Failed to create OTLP exporter: {}", e))?;

        let resource = Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("service.version", API_VERSION),
        ]);

        Ok(TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(resource)
            .build())
    }
}
