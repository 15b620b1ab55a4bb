//! Logging, tracing and metrics setup
//!
//! The shim logs through `tracing`. This module installs a subscriber with an
//! `EnvFilter` and a JSON formatter writing to **stderr**, since a service's
//! stdout belongs to the service. OTLP export of traces and metrics can be
//! switched on for deployments that run a collector next to the service; both
//! are off by default because the sandbox normally has none.
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use hutshim_core::ObservabilityConfig;
//!
//! let config = ObservabilityConfig::new("image-resizer")
//!     .with_log_level("debug");
//!
//! hutshim_core::init_observability(config).expect("Failed to init observability");
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., "info", "hutshim_runner=debug")
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint when export is enabled

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type InitResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

static INITIALIZED: OnceLock<()> = OnceLock::new();
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();
static METER_PROVIDER: OnceLock<SdkMeterProvider> = OnceLock::new();

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "hutshim"
/// - Service version: Current crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Trace and metric export disabled
/// - Log level: `$RUST_LOG` or "info"
///
/// # Examples
///
/// ```rust
/// use hutshim_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("image-resizer")
///     .with_endpoint("http://collector:4317")
///     .with_traces(true);
/// assert!(config.enable_traces);
/// assert!(!config.enable_metrics);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to exported telemetry
    pub service_name: String,
    /// Service version attached to exported telemetry
    pub service_version: String,
    /// OTLP gRPC endpoint of the collector
    pub otlp_endpoint: String,
    /// Export spans over OTLP
    pub enable_traces: bool,
    /// Export metrics over OTLP
    pub enable_metrics: bool,
    /// Log filter directive used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "hutshim".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }
}

/// Install the global subscriber and, if enabled, OTLP exporters
///
/// Only the first call in a process does anything; later calls return
/// `Ok(())` without touching the global state. That lets tests and
/// embedding binaries call it freely.
///
/// # Errors
///
/// - Invalid log filter directive
/// - OTLP exporter construction failure
pub fn init_observability(config: ObservabilityConfig) -> InitResult<()> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;
    let _ = INITIALIZED.set(());

    tracing::debug!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "observability initialized"
    );

    Ok(())
}

fn resource(config: &ObservabilityConfig) -> opentelemetry_sdk::Resource {
    opentelemetry_sdk::Resource::builder_empty()
        .with_attributes(vec![
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                config.service_name.clone(),
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                config.service_version.clone(),
            ),
        ])
        .build()
}

fn init_tracer(config: &ObservabilityConfig) -> InitResult<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource(config))
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> InitResult<()> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    // Requests are short-lived; export often enough that a single-shot run
    // still gets its data out.
    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(5))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource(config))
        .build();

    let _ = METER_PROVIDER.set(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> InitResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .json();

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    // try_init: another subscriber may already be installed by the embedding
    // binary or a test harness.
    let _ = tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    Ok(())
}

/// Flush and stop the OTLP exporters
///
/// Call before the process exits, in particular before
/// `std::process::exit`, which skips destructors. Does nothing when export
/// was never enabled. Safe to call more than once; only the first call
/// flushes.
pub fn shutdown_observability() {
    tracing::debug!("observability shutdown");

    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "span exporter shutdown failed");
        }
    }
    if let Some(provider) = METER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "metric exporter shutdown failed");
        }
    }
}
