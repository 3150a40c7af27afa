//! Tracer setup and trace export

use crate::attributes::{PROJECT_NAME, SYSTEM_NAME};
use crate::spans::SpanTree;
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Config, TracerProvider};
use std::collections::HashMap;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    Exporter(String),

    #[error("Invalid collector header '{0}', expected key=value")]
    InvalidHeader(String),

    #[error("Telemetry shutdown failed: {0}")]
    Shutdown(String),
}

/// Trace export settings
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Reported as `openinference.project.name` and `service.name`
    pub project_name: String,
    /// Collector base URL. No exporter is installed when absent.
    pub collector_endpoint: Option<String>,
    /// Comma separated `key=value` pairs sent with every export request
    pub headers: Option<String>,
    /// Install the global `tracing` subscriber (fmt + env filter + otel layer)
    pub install_subscriber: bool,
}

impl TelemetryConfig {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            collector_endpoint: None,
            headers: None,
            install_subscriber: true,
        }
    }

    pub fn with_collector(mut self, endpoint: impl Into<String>) -> Self {
        self.collector_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }
}

/// Parse `k=v,k2=v2` into a header map. Empty segments are skipped.
pub fn parse_headers(raw: &str) -> Result<HashMap<String, String>, TelemetryError> {
    let mut headers = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| TelemetryError::InvalidHeader(pair.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TelemetryError::InvalidHeader(pair.to_string()));
        }
        headers.insert(key.to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// OTLP/HTTP traces URL for a collector base URL
pub fn traces_endpoint(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1/traces") {
        base.to_string()
    } else {
        format!("{}/v1/traces", base)
    }
}

/// Handle on the installed tracer provider
pub struct Telemetry {
    provider: TracerProvider,
    spans: SpanTree,
}

impl Telemetry {
    pub fn spans(&self) -> SpanTree {
        self.spans.clone()
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// Flush pending spans and stop the exporter
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        for result in self.provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Span flush failed");
            }
        }
        self.provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))
    }
}

/// Initialize telemetry.
///
/// This sets up:
/// - A tracer provider tagged with the project name, exporting over
///   OTLP/HTTP in batches when a collector endpoint is configured
/// - Integration with the tracing subscriber
/// - Structured logging output filtered by `RUST_LOG`
///
/// Must be called from within a Tokio runtime when a collector is configured.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    let resource = Resource::new(vec![
        KeyValue::new(PROJECT_NAME, config.project_name.clone()),
        KeyValue::new("service.name", config.project_name.clone()),
    ]);

    let mut builder =
        TracerProvider::builder().with_config(Config::default().with_resource(resource));

    if let Some(endpoint) = &config.collector_endpoint {
        let headers = match &config.headers {
            Some(raw) => parse_headers(raw)?,
            None => HashMap::new(),
        };
        let url = traces_endpoint(endpoint);

        let exporter = opentelemetry_otlp::new_exporter()
            .http()
            .with_endpoint(url.clone())
            .with_headers(headers)
            .build_span_exporter()
            .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

        let processor =
            BatchSpanProcessor::builder(exporter, opentelemetry_sdk::runtime::Tokio).build();
        builder = builder.with_span_processor(processor);
        tracing::info!(endpoint = %url, "OTLP span exporter configured");
    }

    let provider = builder.build();
    let spans = SpanTree::from_provider(&provider);

    if config.install_subscriber {
        let telemetry_layer =
            tracing_opentelemetry::layer().with_tracer(provider.tracer(SYSTEM_NAME));

        // A subscriber may already be installed (tests, embedding apps)
        let installed = tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_line_number(true),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        if installed.is_err() {
            tracing::debug!("Global tracing subscriber already set");
        }
    }

    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(Telemetry { provider, spans })
}
