//! Logging setup and run telemetry.

use crate::run::{ExportRun, RunStatus};
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::{global, KeyValue};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn,mmap_export=info,mmap=info";

/// Runs slower than this are flagged in the logs.
const SLOW_RUN_MS: i64 = 10_000;

/// Log line format for the stderr subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global tracing subscriber. Logs go to stderr so stdout
/// stays free for `--json` output.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Installs an OTLP span exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// Returns `Ok(false)` when no endpoint is configured. Reads:
/// - `OTEL_EXPORTER_OTLP_ENDPOINT` - Collector endpoint
/// - `OTEL_SERVICE_NAME` - Service name (default: mmap-export)
pub fn init_otlp() -> Result<bool, Box<dyn std::error::Error>> {
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::Config;

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(false);
    };
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "mmap-export".to_string());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(&endpoint),
        )
        .with_trace_config(Config::default().with_resource(
            opentelemetry_sdk::Resource::new(vec![
                KeyValue::new("service.name", service_name),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    if let Some(provider) = tracer.provider() {
        global::set_tracer_provider(provider);
    }

    info!("Telemetry initialized: endpoint={}", endpoint);
    Ok(true)
}

/// Flushes pending spans. No-op when OTLP was never installed.
pub fn shutdown() {
    global::shutdown_tracer_provider();
}

/// Emits a `mindmap_export` span and a structured log line for a finished run.
pub fn record_run(run: &ExportRun) {
    let tracer = global::tracer("mmap-export");
    let mut span = tracer.start("mindmap_export");

    span.set_attribute(KeyValue::new("run_id", run.run_id.to_string()));
    span.set_attribute(KeyValue::new("kind", run.kind.to_string()));
    span.set_attribute(KeyValue::new("status", run.status.to_string()));
    span.set_attribute(KeyValue::new("scale", run.scale));

    if let Some(canvas) = run.canvas {
        span.set_attribute(KeyValue::new("canvas_width", canvas.width));
        span.set_attribute(KeyValue::new("canvas_height", canvas.height));
    }
    if let Some(bytes) = run.bytes_written {
        span.set_attribute(KeyValue::new("bytes_written", bytes as i64));
    }

    if let Some(duration_ms) = run.duration_ms() {
        span.set_attribute(KeyValue::new("duration_ms", duration_ms));

        info!(
            run_id = %run.run_id,
            kind = %run.kind,
            status = %run.status,
            duration_ms = duration_ms,
            "Mind map export finished"
        );

        if duration_ms > SLOW_RUN_MS {
            warn!(
                run_id = %run.run_id,
                duration_ms = duration_ms,
                "Mind map export exceeded {}ms",
                SLOW_RUN_MS
            );
        }
    }

    if run.status == RunStatus::Failed {
        if let Some(ref error) = run.error {
            span.set_attribute(KeyValue::new("error", error.clone()));
        }
    }

    span.end();
}
