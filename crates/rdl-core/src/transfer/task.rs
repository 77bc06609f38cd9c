//! Transfer task - one sequential resumable download
//!
//! A transfer runs to exactly one terminal state:
//! resume-offset detection -> range request -> response validation ->
//! streaming copy with progress -> outcome.

use crate::error::{ErrorKind, TransferError};
use crate::transfer::range::{content_length, parse_content_range};
use crate::transfer::{TransferConfig, TransferHooks};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use rdl_types::{TransferStatus, TransferSummary, WriteMode};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Final result of a transfer attempt
#[derive(Debug)]
pub struct TransferOutcome {
    pub id: Uuid,
    pub url: String,
    pub destination: PathBuf,
    pub status: TransferStatus,
    /// Set exactly when `status` is `Unsupported` or `Failed`
    pub error: Option<TransferError>,
    pub resume_offset: u64,
    pub bytes_written: u64,
    pub total_size: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the attempt reached a logically resolved end.
    ///
    /// False only for configuration, transport and storage faults and for a
    /// broken body read; a server rejection, an early close, a pause or a
    /// success all count as resolved.
    pub fn is_resolved(&self) -> bool {
        match &self.error {
            None => true,
            Some(TransferError::UnexpectedEof { .. }) => true,
            Some(err) => err.kind() == ErrorKind::Protocol,
        }
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            id: self.id,
            url: self.url.clone(),
            destination: self.destination.clone(),
            status: self.status,
            resume_offset: self.resume_offset,
            bytes_written: self.bytes_written,
            total_size: self.total_size,
            error: self.error.as_ref().map(|e| e.to_string()),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn into_result(self) -> Result<TransferStatus, TransferError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.status),
        }
    }
}

/// Runtime counters, dropped when the transfer ends
#[derive(Debug, Default)]
struct TransferState {
    resume_offset: u64,
    total_size: Option<u64>,
    /// Bytes on disk, starting at `resume_offset`; never exceeds a known total
    bytes_written: u64,
}

/// A single download, ready to run
#[derive(Debug)]
pub struct Transfer {
    id: Uuid,
    client: Client,
    config: TransferConfig,
    hooks: TransferHooks,
}

impl Transfer {
    pub fn new(client: Client, config: TransferConfig, hooks: TransferHooks) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            config,
            hooks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Spawn the transfer on its own task. Must be called within a tokio runtime.
    pub fn start(self) -> TransferHandle {
        let id = self.id;
        let url = self.config.url.to_string();
        let destination = self.config.destination.clone();
        let started_at = Utc::now();
        let inner = tokio::spawn(self.run());

        TransferHandle {
            id,
            url,
            destination,
            started_at,
            inner,
        }
    }

    /// Run the transfer to completion on the current task
    pub async fn run(self) -> TransferOutcome {
        let Transfer {
            id,
            client,
            config,
            mut hooks,
        } = self;

        let started_at = Utc::now();
        info!("Transfer {}: {} -> {}", id, config.url, config.destination.display());

        let mut state = TransferState::default();
        let result = execute(id, &client, &config, &mut hooks, &mut state).await;

        let (status, error) = match result {
            Ok(status) => (status, None),
            Err(err @ TransferError::PartialContentNotSupported { .. }) => {
                warn!("Transfer {}: {}", id, err);
                (TransferStatus::Unsupported, Some(err))
            }
            Err(err) => {
                error!("Transfer {} failed: {}", id, err);
                (TransferStatus::Failed, Some(err))
            }
        };

        let outcome = TransferOutcome {
            id,
            url: config.url.to_string(),
            destination: config.destination,
            status,
            error,
            resume_offset: state.resume_offset,
            bytes_written: state.bytes_written,
            total_size: state.total_size,
            started_at,
            finished_at: Utc::now(),
        };

        hooks.complete(&outcome);
        outcome
    }
}

/// Handle to a spawned transfer; consumed by waiting on it
#[derive(Debug)]
pub struct TransferHandle {
    id: Uuid,
    url: String,
    destination: PathBuf,
    started_at: DateTime<Utc>,
    inner: JoinHandle<TransferOutcome>,
}

impl TransferHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the transfer to end
    pub async fn wait(self) -> TransferOutcome {
        let TransferHandle {
            id,
            url,
            destination,
            started_at,
            inner,
        } = self;

        match inner.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!("Transfer {}: task did not finish: {}", id, join_err);
                TransferOutcome {
                    id,
                    url,
                    destination,
                    status: TransferStatus::Failed,
                    error: Some(TransferError::TaskPanicked(join_err.to_string())),
                    resume_offset: 0,
                    bytes_written: 0,
                    total_size: None,
                    started_at,
                    finished_at: Utc::now(),
                }
            }
        }
    }

    /// Block the current thread until the transfer ends.
    ///
    /// Must not be called from inside an async context.
    pub fn wait_blocking(self) -> TransferOutcome {
        futures::executor::block_on(self.wait())
    }
}

async fn execute(
    id: Uuid,
    client: &Client,
    config: &TransferConfig,
    hooks: &mut TransferHooks,
    state: &mut TransferState,
) -> Result<TransferStatus, TransferError> {
    let path = config.destination.as_path();

    state.resume_offset = detect_resume_offset(config).await?;
    state.bytes_written = state.resume_offset;
    if state.resume_offset > 0 {
        info!("Transfer {}: resuming from byte {}", id, state.resume_offset);
    }

    let response = send_range_request(id, client, config, state.resume_offset).await?;

    let remaining = if state.resume_offset > 0 {
        match validate_resumed(path, state.resume_offset, &response)? {
            Some(remaining) => Some(remaining),
            None => {
                info!("Transfer {}: local file is already complete", id);
                return Ok(TransferStatus::AlreadyComplete);
            }
        }
    } else {
        validate_fresh(id, &response)?
    };
    state.total_size = remaining.map(|r| state.resume_offset + r);

    let mut file = open_destination(path, config.mode).await?;

    let result = copy_body(id, response, &mut file, config, hooks, state).await;
    // Pending writes must land before the outcome is published
    let flushed = file.flush().await;
    let status = result?;
    flushed.map_err(|e| TransferError::storage(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| TransferError::storage(path, e))?;

    match (status, state.total_size) {
        (TransferStatus::Completed, Some(total)) if state.bytes_written < total => {
            Err(TransferError::UnexpectedEof {
                written: state.bytes_written,
                total,
            })
        }
        (TransferStatus::Completed, _) => {
            info!("Transfer {} completed ({} bytes)", id, state.bytes_written);
            Ok(TransferStatus::Completed)
        }
        (status, _) => Ok(status),
    }
}

/// Bytes already present locally, or 0 when overwriting or absent
async fn detect_resume_offset(config: &TransferConfig) -> Result<u64, TransferError> {
    if config.mode == WriteMode::Overwrite {
        return Ok(0);
    }

    let path = &config.destination;
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Err(TransferError::IsDirectory(path.clone())),
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(source) => Err(TransferError::Stat {
            path: path.clone(),
            source,
        }),
    }
}

async fn send_range_request(
    id: Uuid,
    client: &Client,
    config: &TransferConfig,
    offset: u64,
) -> Result<Response, TransferError> {
    let mut request = client.get(config.url.clone());
    for (name, value) in &config.headers {
        if name.eq_ignore_ascii_case(RANGE.as_str()) {
            warn!("Transfer {}: ignoring caller Range header {:?}", id, value);
            continue;
        }
        request = request.header(name.as_str(), value.as_str());
    }

    // Sent even at offset 0
    let range = format!("bytes={}-", offset);
    debug!("Transfer {}: requesting range {}", id, range);
    Ok(request.header(RANGE, range).send().await?)
}

/// Validate the answer to a resumed request.
///
/// Returns the remaining byte count, or `None` when the server reports the
/// range as unsatisfiable (the local file is complete).
fn validate_resumed(
    path: &Path,
    offset: u64,
    response: &Response,
) -> Result<Option<u64>, TransferError> {
    let status = response.status();
    if status == StatusCode::RANGE_NOT_SATISFIABLE {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(server_error(status));
    }

    let unsupported = |detail: String| TransferError::PartialContentNotSupported {
        path: path.to_path_buf(),
        detail,
    };

    let header = response
        .headers()
        .get(CONTENT_RANGE)
        .ok_or_else(|| unsupported(format!("{} without Content-Range", status)))?;
    let value = header
        .to_str()
        .map_err(|_| unsupported("non-ASCII Content-Range".to_string()))?;
    let range = parse_content_range(value).map_err(unsupported)?;
    debug!(
        "Content-Range {}-{} of {:?}",
        range.start, range.end, range.complete_length
    );

    if range.start != offset {
        return Err(unsupported(format!(
            "range starts at {} but {} bytes are on disk",
            range.start, offset
        )));
    }

    Ok(Some(range.len()))
}

/// Validate the answer to a request from byte 0; returns the body size if known
fn validate_fresh(id: Uuid, response: &Response) -> Result<Option<u64>, TransferError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(server_error(status));
    }

    match content_length(response.headers()) {
        Ok(length) => Ok(length),
        Err(detail) => {
            warn!("Transfer {}: {}, total size unknown", id, detail);
            Ok(None)
        }
    }
}

fn server_error(status: StatusCode) -> TransferError {
    warn!("Server answered {}", status);
    TransferError::ServerError {
        status: status.as_u16(),
        message: status.to_string(),
    }
}

async fn open_destination(path: &Path, mode: WriteMode) -> Result<File, TransferError> {
    let mut options = OpenOptions::new();
    options
        .read(true)
        .write(true)
        .create(true)
        .truncate(mode == WriteMode::Overwrite);
    #[cfg(unix)]
    options.mode(0o664);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| TransferError::storage(path, e))?;
    file.seek(SeekFrom::End(0))
        .await
        .map_err(|e| TransferError::storage(path, e))?;
    Ok(file)
}

/// Stream the body into `file` in reads of at most `chunk_size` bytes.
///
/// Returns `Completed` at end of stream (the caller checks the byte count)
/// or `Paused` when the progress hook breaks.
async fn copy_body(
    id: Uuid,
    response: Response,
    file: &mut File,
    config: &TransferConfig,
    hooks: &mut TransferHooks,
    state: &mut TransferState,
) -> Result<TransferStatus, TransferError> {
    let path = config.destination.as_path();
    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);
    let mut buffer = vec![0u8; config.chunk_size.get()];

    loop {
        let n = reader
            .read(&mut buffer)
            .await
            .map_err(|source| TransferError::Stream {
                written: state.bytes_written,
                source,
            })?;
        if n == 0 {
            return Ok(TransferStatus::Completed);
        }

        let mut chunk = &buffer[..n];
        let overrun = match state.total_size {
            Some(total) if state.bytes_written + n as u64 > total => {
                chunk = &chunk[..(total - state.bytes_written) as usize];
                Some(total)
            }
            _ => None,
        };

        file.write_all(chunk)
            .await
            .map_err(|e| TransferError::storage(path, e))?;
        state.bytes_written += chunk.len() as u64;
        let flow = hooks.progress(state.bytes_written, state.total_size);

        if let Some(total) = overrun {
            return Err(TransferError::Overrun { total });
        }

        if flow.is_break() {
            info!(
                "Transfer {} paused at {} bytes",
                id, state.bytes_written
            );
            return Ok(TransferStatus::Paused);
        }
    }
}
