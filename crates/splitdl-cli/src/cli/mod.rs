//! CLI for the splitdl segmented downloader.

mod prompt;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use splitdl_core::config;
use splitdl_core::scheduler::{self, JobOptions};
use splitdl_core::transport::{CurlOptions, CurlTransport, Transport};
use tokio::sync::mpsc;

/// Top-level CLI for the splitdl downloader.
#[derive(Debug, Parser)]
#[command(name = "splitdl")]
#[command(about = "splitdl: segmented parallel HTTP downloader", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download. Asked for interactively when omitted.
    pub url: Option<String>,

    /// Number of segments to start with (overrides `max_workers` from the config).
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Directory for the finished file (default: current directory).
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Parses arguments, runs one download and returns the process exit code.
pub async fn run_from_args() -> Result<i32> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_init()?;
    if let Some(workers) = cli.workers {
        cfg.max_workers = workers;
    }
    tracing::debug!("loaded config: {:?}", cfg);

    let url = match cli.url {
        Some(url) => url,
        None => tokio::task::spawn_blocking(prompt::read_url_from_stdin)
            .await
            .context("prompt task join")??,
    };
    let output_dir = match cli.output_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let opts = JobOptions::from_config(&cfg, output_dir);
    let transport: Arc<dyn Transport> = Arc::new(CurlTransport::new(CurlOptions::from(&cfg)));
    let (tx, rx) = mpsc::channel(64);
    let printer = tokio::spawn(render::print_notifications(rx));

    let result = scheduler::run_download(&url, &opts, transport, tx).await;
    let last = printer.await.context("notification printer join")?;

    // The outcome itself was already shown to the user by the printer.
    if let Ok(report) = &result {
        tracing::info!(
            path = %report.path.display(),
            workers = report.workers_spawned,
            failures = report.segment_failures,
            "done"
        );
    }
    Ok(render::exit_code(last))
}
