//! `mmap`: Markmap HTML to PDF/PNG.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `CHROME`: Chromium executable (same as `--chrome`)
//! - `RUST_LOG`: Log filter (default: warn,mmap_export=info)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector endpoint, enables span export

use anyhow::{Context, Result};
use clap::Parser;
use mmap_export::exporter::MindmapExporter;
use mmap_export::request::ExportRequest;
use mmap_export::run::ExportRun;
use mmap_export::session::SessionConfig;
use mmap_export::telemetry::{self, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info_span, warn};

#[derive(Parser, Debug)]
#[command(name = "mmap", version, about = "Markmap HTML to PDF/PNG")]
struct Cli {
    /// Input Markmap HTML file
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output file path (.pdf or .png)
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// PNG export scale factor
    #[arg(short, long, value_name = "NUMBER", default_value = "2", allow_hyphen_values = true)]
    scale: String,

    /// Chromium executable to launch instead of the auto-detected one
    #[arg(long, env = "CHROME", value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Maximum seconds to wait for the page to go network-idle
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    idle_timeout: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print the run record as JSON to stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format);

    if let Err(e) = telemetry::init_otlp() {
        warn!("Failed to initialize telemetry: {}", e);
    }

    let request = match ExportRequest::new(&cli.input, &cli.output, &cli.scale) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = match run_export(&cli, request).await {
        Ok(run) if run.error.is_none() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Runtime Error: {:#}", e);
            ExitCode::FAILURE
        }
    };

    telemetry::shutdown();
    code
}

/// Runs one export on a blocking thread and reports the outcome.
async fn run_export(cli: &Cli, request: ExportRequest) -> Result<ExportRun> {
    let config = SessionConfig {
        chrome_path: cli.chrome.clone(),
        idle_timeout: Duration::from_secs(cli.idle_timeout),
    };

    let mut run = ExportRun::new(&request);
    let span = info_span!("export", run_id = %run.run_id, kind = %request.kind);

    run.start_rendering();
    let result = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        MindmapExporter::new().export_with_browser(&config, &request)
    })
    .await
    .context("Export task panicked")?;

    match result {
        Ok(outcome) => run.mark_complete(outcome.canvas, outcome.bytes_written),
        Err(e) => {
            error!(run_id = %run.run_id, "Export failed: {}", e);
            eprintln!("Runtime Error: {}", e);
            run.mark_failed(e.to_string());
        }
    }

    telemetry::record_run(&run);

    if cli.json {
        let json = serde_json::to_string_pretty(&run).context("Failed to serialize run record")?;
        println!("{}", json);
    }

    Ok(run)
}
