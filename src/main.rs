//! vibration-diag - upload vibration recordings and diagnose them
//!
//! # Usage
//!
//! ```bash
//! # Upload two recordings for machine M-101 and analyze them
//! vibration-diag run --machine M-101 pump_de.csv pump_nde.csv
//!
//! # Same, picking the first registered machine and retrying failures twice
//! vibration-diag run --retry-failed 2 pump_de.csv
//!
//! # List machines known to the backend
//! vibration-diag machines
//!
//! # Chart series for a saved analysis result
//! vibration-diag series result.json
//! ```
//!
//! # Environment Variables
//!
//! - `VIBDIAG_CONFIG`: Path to a TOML config file (default: ./vibdiag.toml)
//! - `VIBDIAG_BACKEND_URL`: Analysis service base URL (overrides config)
//! - `VIBDIAG_LOG_JSON`: Emit logs as JSON lines (same as `--log-json`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use vibration_diag::backend::AnalysisReport;
use vibration_diag::config::AppConfig;
use vibration_diag::series::{self, ResultView};
use vibration_diag::types::{AnalysisResult, FileBlob, RecordId, UploadRequest};
use vibration_diag::{DiagnoseSession, HttpBackend, MachineDirectory, WorkQueue};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vibration-diag")]
#[command(about = "Upload vibration recordings and run fault diagnosis")]
#[command(version)]
struct CliArgs {
    /// Analysis service base URL (overrides config)
    #[arg(long, env = "VIBDIAG_BACKEND_URL")]
    backend_url: Option<String>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of plain text
    #[arg(long, global = true, env = "VIBDIAG_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Upload recordings, create records and analyze them
    Run {
        /// Machine identifier (default: first machine the backend lists)
        #[arg(short, long)]
        machine: Option<String>,
        /// Sensor mounting position
        #[arg(long)]
        sensor_position: Option<String>,
        /// Measurement axis
        #[arg(long)]
        axis: Option<String>,
        /// Sampling rate of the recordings (Hz)
        #[arg(long)]
        sampling_rate: Option<u32>,
        /// Files processed at once (1 = sequential)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Extra rounds that re-analyze only failed records
        #[arg(long, default_value = "0")]
        retry_failed: u32,
        /// Write analysis results as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Recording files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List machines registered with the backend
    Machines,

    /// Derive chart series from a saved analysis result
    Series {
        /// JSON file holding an analysis result or a raw service response
        path: PathBuf,
    },

    /// Check that the analysis service is reachable
    Health,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::load(),
    };
    if let Some(url) = args.backend_url {
        config.backend.base_url = url;
    }

    match args.command {
        SubCommand::Run {
            machine,
            sensor_position,
            axis,
            sampling_rate,
            concurrency,
            retry_failed,
            output,
            files,
        } => {
            if let Some(position) = sensor_position {
                config.upload.sensor_position = position;
            }
            if let Some(axis) = axis {
                config.upload.axis = axis;
            }
            if let Some(rate) = sampling_rate {
                config.upload.sampling_rate_hz = rate;
            }
            if let Some(limit) = concurrency {
                config.upload.concurrency = limit;
                config.analysis.concurrency = limit;
            }
            config.validate().context("Invalid configuration")?;

            let backend = connect(&config)?;
            if let Err(e) = backend.health_check().await {
                warn!(error = %e, "Analysis service health check failed, continuing");
            }
            run(
                &config,
                backend,
                machine.as_deref(),
                &files,
                retry_failed,
                output.as_deref(),
            )
            .await
        }
        SubCommand::Machines => {
            let backend = connect(&config)?;
            let machines = backend
                .list_machines()
                .await
                .context("Failed to list machines")?;
            info!(count = machines.len(), "Machines loaded");
            println!("{}", serde_json::to_string_pretty(&machines)?);
            Ok(())
        }
        SubCommand::Series { path } => {
            let result = load_result(&path)?;
            let view = ResultView::of(0, &result);
            if series::derive(&result).is_none() {
                warn!(record_id = %result.record_id, "No signal analysis, charts suppressed");
            }
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        SubCommand::Health => {
            let backend = connect(&config)?;
            backend
                .health_check()
                .await
                .with_context(|| format!("Analysis service at {} is unhealthy", backend.base_url()))?;
            info!(url = %backend.base_url(), "Analysis service healthy");
            Ok(())
        }
    }
}

fn connect(config: &AppConfig) -> Result<HttpBackend> {
    HttpBackend::new(
        &config.backend.base_url,
        Duration::from_secs(config.backend.timeout_secs),
    )
    .context("Failed to build HTTP client")
}

async fn run(
    config: &AppConfig,
    backend: HttpBackend,
    machine: Option<&str>,
    files: &[PathBuf],
    retry_rounds: u32,
    output: Option<&Path>,
) -> Result<()> {
    let blobs = files
        .iter()
        .map(|path| {
            FileBlob::read(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let session = DiagnoseSession::new(Arc::new(backend)).with_queues(
        WorkQueue::bounded(config.upload.concurrency),
        WorkQueue::bounded(config.analysis.concurrency),
    );
    session.select_batch(blobs).await;

    let machine_id = session
        .resolve_machine(machine)
        .await
        .context("No machine to upload against")?;
    let request = UploadRequest {
        machine_id,
        sensor_position: config.upload.sensor_position.clone(),
        axis: config.upload.axis.clone(),
        sampling_rate_hz: config.upload.sampling_rate_hz,
    };

    let outcome = session.process(&request).await.context("Upload rejected")?;
    for (index, message) in &outcome.failures {
        let file = files.get(*index).map(|p| p.display().to_string()).unwrap_or_default();
        warn!(index, file = %file, error = %message, "Upload failed");
    }
    if outcome.record_ids.is_empty() {
        anyhow::bail!("No files were uploaded");
    }

    session.analyze().await;
    for round in 1..=retry_rounds {
        if session.summary().await.failed == 0 {
            break;
        }
        info!(round, "Retrying failed analyses");
        session.retry_failed().await;
    }

    let summary = session.summary().await;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "{}",
        summary
    );

    for view in session.views().await {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }

    if let Some(path) = output {
        let results = session.results().await;
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), results = results.len(), "Results saved");
    }
    Ok(())
}

/// Accepts a saved [`AnalysisResult`], the first entry of a saved result
/// list, or a raw analysis service response.
fn load_result(path: &Path) -> Result<AnalysisResult> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if let Ok(result) = serde_json::from_str::<AnalysisResult>(&text) {
        return Ok(result);
    }
    if let Ok(results) = serde_json::from_str::<Vec<AnalysisResult>>(&text) {
        return results
            .into_iter()
            .next()
            .context("Result list is empty");
    }

    let report: AnalysisReport =
        serde_json::from_str(&text).context("Not an analysis result or service response")?;
    let record_id = report
        .record_id
        .clone()
        .map(RecordId::new)
        .unwrap_or_else(|| RecordId::new(path.display().to_string()));
    let analyzed = report
        .into_analyzed()
        .context("Service response reports a failed analysis")?;
    Ok(AnalysisResult::ok(
        record_id,
        analyzed.analyzed_at.unwrap_or_else(chrono::Utc::now),
        analyzed.diagnosis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_json_flag_is_accepted_after_the_subcommand() {
        let args = CliArgs::try_parse_from(["vibration-diag", "health", "--log-json"]).unwrap();
        assert!(args.log_json);
        assert!(matches!(args.command, SubCommand::Health));

        let args = CliArgs::try_parse_from(["vibration-diag", "machines"]).unwrap();
        assert!(!args.log_json);
    }
}
