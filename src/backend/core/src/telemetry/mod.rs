//! Telemetry: structured logging, optional OTLP trace export and Prometheus metrics.
//!
//! ```rust,no_run
//! use salon_core::config::ObservabilityConfig;
//!
//! let guard = salon_core::telemetry::init(&ObservabilityConfig::default())
//!     .expect("Failed to initialize telemetry");
//! // ... serve ...
//! guard.shutdown();
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{build_filter, redact_credentials};

use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ObservabilityConfig};

/// Handle for flushing exporters on shutdown.
#[derive(Debug)]
#[must_use = "dropping the guard skips flushing buffered spans"]
pub struct TelemetryGuard {
    otlp_enabled: bool,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        if self.otlp_enabled {
            opentelemetry::global::shutdown_tracer_provider();
        }
        tracing::info!("Telemetry shutdown complete");
    }
}

/// Install the metrics recorder and the global tracing subscriber.
///
/// Must be called once, from inside a tokio runtime when an OTLP endpoint
/// is configured.
pub fn init(config: &ObservabilityConfig) -> anyhow::Result<TelemetryGuard> {
    metrics::install()?;

    let tracer = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => Some(
            opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                    opentelemetry_sdk::Resource::new(vec![
                        opentelemetry::KeyValue::new("service.name", config.service_name.clone()),
                        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    ]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?,
        ),
        None => None,
    };
    let otlp_enabled = tracer.is_some();

    let filter = build_filter(&config.log_level)?;
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(otel_layer)
                .with(fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(otel_layer)
                .with(fmt::layer().pretty())
                .try_init()?;
        }
    }

    tracing::info!(
        service_name = %config.service_name,
        log_format = ?config.log_format,
        otlp = otlp_enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { otlp_enabled })
}
