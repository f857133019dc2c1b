//! Tracing pipeline initialisation for KinOS.
//!
//! Call [`init_tracing`] once at process startup.  It reads
//! [`TelemetrySettings`] from the environment and installs the global
//! `tracing` subscriber, adding an OTLP span exporter when a collector is
//! configured.  A second install fails with
//! [`TelemetryError::AlreadyInstalled`] instead of panicking, so embedding
//! the engine in a host that already owns the subscriber is safe.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set the OTLP HTTP exporter is activated. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `KINOS_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//!
//! # Example
//!
//! ```rust,no_run
//! // Hold the guard for the entire lifetime of the process.
//! let _guard = kinos_runtime::telemetry::init_tracing("kinos").expect("tracing");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("OTLP exporter init failed: {0}")]
    Exporter(String),

    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// Newline-delimited JSON, one object per event.
    Json,
}

/// What [`try_init_tracing`] installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    /// `EnvFilter` directives, e.g. `"info,kinos_runtime=debug"`.
    pub filter: String,
    pub format: LogFormat,
    /// OTLP/HTTP collector URL; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            otlp_endpoint: None,
        }
    }
}

impl TelemetrySettings {
    /// Read `RUST_LOG`, `KINOS_LOG_FORMAT` and `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let format = match var("KINOS_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self {
            filter: var("RUST_LOG")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            format,
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty()),
        }
    }
}

/// Install the global subscriber using [`TelemetrySettings::from_env`].
///
/// The returned [`TracerProviderGuard`] must be held for the lifetime of the
/// process; dropping it flushes pending spans.
pub fn init_tracing(service_name: &str) -> Result<TracerProviderGuard, TelemetryError> {
    try_init_tracing(service_name, &TelemetrySettings::from_env())
}

/// Install the global subscriber described by `settings`.
///
/// With an OTLP endpoint, spans such as the `KinematicsLoop::refresh` span
/// are also exported over OTLP/HTTP.
///
/// # Errors
///
/// Nothing is installed when the filter does not parse, the exporter cannot
/// be built, or another subscriber already owns the process.
pub fn try_init_tracing(
    service_name: &str,
    settings: &TelemetrySettings,
) -> Result<TracerProviderGuard, TelemetryError> {
    let env_filter = EnvFilter::try_new(&settings.filter)?;

    // Owned by the guard from here on, so a failed install still shuts the
    // provider down.
    let guard = TracerProviderGuard(build_provider(
        service_name,
        settings.otlp_endpoint.as_deref(),
    )?);
    let otel_layer = guard
        .0
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("kinos")));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);
    match settings.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?,
    }

    Ok(guard)
}

/// RAII guard that shuts down the OTel [`SdkTracerProvider`] on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// `true` when spans are being exported over OTLP.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "OpenTelemetry provider shutdown failed");
        }
    }
}

fn build_provider(
    service_name: &str,
    endpoint: Option<&str>,
) -> Result<Option<SdkTracerProvider>, TelemetryError> {
    let Some(endpoint) = endpoint else {
        return Ok(None);
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Ok(Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Synchronous export: the control loop may run without a Tokio
            // runtime, and a batch exporter spawns tasks.
            .with_simple_exporter(exporter)
            .build(),
    ))
}
