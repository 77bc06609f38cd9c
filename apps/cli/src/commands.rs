//! CLI command implementations

use crate::output::{format_bytes, format_speed, print_output};
use crate::progress::TransferProgress;
use crate::OutputFormat;
use anyhow::{anyhow, Context, Result};
use console::style;
use rdl_core::{sample_hash, Downloader};
use rdl_types::{ClientSettings, TransferStatus, TransferSummary};
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Arguments of `rdl get`
pub struct GetRequest {
    pub url: String,
    pub output: Option<PathBuf>,
    pub overwrite: bool,
    pub headers: Vec<(String, String)>,
    pub stop_after: Option<u64>,
}

/// Parse a `Name: value` header argument
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid header {:?}, expected 'Name: value'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header {:?}, empty name", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse a chunk size; zero is rejected
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    s.trim()
        .parse::<NonZeroUsize>()
        .map(NonZeroUsize::get)
        .map_err(|e| format!("invalid chunk size {:?}: {}", s, e))
}

/// File name taken from the last URL path segment
fn default_output(url: &str) -> Result<PathBuf> {
    let parsed = url::Url::parse(url).map_err(|_| anyhow!("Invalid URL: {}", url))?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("download");
    let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(dir.join(name))
}

// ============================================================================
// Download Command
// ============================================================================

/// Run one transfer; returns whether the exit status should be success
pub async fn get(settings: ClientSettings, request: GetRequest, format: OutputFormat) -> Result<bool> {
    let destination = match request.output {
        Some(path) => path,
        None => default_output(&request.url)?,
    };

    debug!("Downloading {} to {}", request.url, destination.display());
    let downloader = Downloader::new(settings)?;
    let mut config = downloader.config(&request.url, &destination)?;
    if request.overwrite {
        config = config.overwrite();
    }
    for (name, value) in request.headers {
        config = config.with_header(name, value);
    }

    let progress = match format {
        OutputFormat::Human => {
            let name = destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            TransferProgress::new(&name)
        }
        OutputFormat::Json => TransferProgress::hidden(),
    };

    let handle = downloader.start(config, progress.hooks(request.stop_after));
    let outcome = handle.wait().await;
    let summary = outcome.summary();
    progress.finish(&summary);

    match format {
        OutputFormat::Json => print_output(&summary, format)?,
        OutputFormat::Human => print_summary(&summary),
    }

    Ok(summary.status.is_success() || summary.status == TransferStatus::Paused)
}

fn print_summary(summary: &TransferSummary) {
    let icon = match summary.status {
        TransferStatus::Completed | TransferStatus::AlreadyComplete => style("✓").green(),
        TransferStatus::Paused => style("⏸").yellow(),
        TransferStatus::Unsupported | TransferStatus::Failed => style("✗").red(),
    };
    println!(
        "{} {} {}",
        icon,
        style(summary.destination.display()).cyan(),
        summary.status
    );

    let size = summary
        .total_size
        .map(format_bytes)
        .unwrap_or_else(|| "?".to_string());
    println!(
        "  {} / {} ({:.1}%)",
        format_bytes(summary.bytes_written),
        size,
        summary.progress()
    );
    if summary.resume_offset > 0 {
        println!("  Resumed from: {}", format_bytes(summary.resume_offset));
    }

    let elapsed = (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0;
    println!("  Speed: {}", format_speed(summary.transferred(), elapsed));

    if let Some(err) = &summary.error {
        println!("  {}", style(err).red());
    }
    if summary.status == TransferStatus::Paused {
        println!("  {}", style("Run the same command again to resume").dim());
    }
}

// ============================================================================
// Hash Command
// ============================================================================

#[derive(Serialize)]
struct HashReport {
    path: PathBuf,
    hash: String,
}

impl fmt::Display for HashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.hash, self.path.display())
    }
}

pub fn hash(path: &Path, format: OutputFormat) -> Result<bool> {
    let hash = sample_hash(path).with_context(|| format!("Hash sum error for {}", path.display()))?;
    let report = HashReport {
        path: path.to_path_buf(),
        hash,
    };
    print_output(&report, format)?;
    Ok(true)
}
