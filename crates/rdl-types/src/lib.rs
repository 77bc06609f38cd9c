//! Shared types for rdl
//!
//! This crate contains the plain data structures shared between
//! the core engine and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Default number of bytes read from the response body per write (2 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 2 << 20;

// ============================================================================
// Transfer Types
// ============================================================================

/// How the local file is treated when a transfer starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep existing bytes and resume after them
    #[default]
    Append,
    /// Truncate and download from the first byte
    Overwrite,
}

/// Terminal status of a single transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Every declared byte was written
    Completed,
    /// The server answered 416 to a resume: the local file already holds everything
    AlreadyComplete,
    /// The progress callback asked to stop; the file is a valid resume point
    Paused,
    /// The server does not honor byte ranges for this resource
    Unsupported,
    Failed,
}

impl TransferStatus {
    pub fn is_success(self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::AlreadyComplete)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Completed => "completed",
            TransferStatus::AlreadyComplete => "already complete",
            TransferStatus::Paused => "paused",
            TransferStatus::Unsupported => "unsupported",
            TransferStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Serializable record of how a transfer ended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub id: Uuid,
    pub url: String,
    pub destination: PathBuf,
    pub status: TransferStatus,
    /// Bytes that were already on disk before this attempt
    pub resume_offset: u64,
    /// Bytes on disk when the attempt ended (includes `resume_offset`)
    pub bytes_written: u64,
    pub total_size: Option<u64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TransferSummary {
    pub fn progress(&self) -> f64 {
        match self.total_size {
            Some(size) if size > 0 => (self.bytes_written as f64 / size as f64) * 100.0,
            _ => 0.0,
        }
    }

    /// Bytes fetched during this attempt only
    pub fn transferred(&self) -> u64 {
        self.bytes_written.saturating_sub(self.resume_offset)
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} [{}]", self.url, self.destination.display(), self.status)?;
        match self.total_size {
            Some(total) => write!(f, " {}/{} bytes ({:.1}%)", self.bytes_written, total, self.progress())?,
            None => write!(f, " {} bytes", self.bytes_written)?,
        }
        if let Some(err) = &self.error {
            write!(f, ": {}", err)?;
        }
        Ok(())
    }
}

// ============================================================================
// Settings Types
// ============================================================================

/// HTTP client settings shared by every transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub user_agent: String,
    /// Connect timeout in seconds (None = no limit)
    pub connect_timeout_secs: Option<u64>,
    /// Proxy URL applied to all schemes
    #[serde(default)]
    pub proxy: Option<String>,
    /// Default streaming chunk size in bytes
    pub chunk_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("rdl/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: Some(30),
            proxy: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(bytes_written: u64, total_size: Option<u64>) -> TransferSummary {
        TransferSummary {
            id: Uuid::new_v4(),
            url: "http://example.com/a.bin".to_string(),
            destination: PathBuf::from("a.bin"),
            status: TransferStatus::Completed,
            resume_offset: 10,
            bytes_written,
            total_size,
            error: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_known_total() {
        let s = summary(50, Some(200));
        assert!((s.progress() - 25.0).abs() < f64::EPSILON);
        assert_eq!(s.transferred(), 40);
    }

    #[test]
    fn test_progress_unknown_total() {
        assert_eq!(summary(50, None).progress(), 0.0);
        assert_eq!(summary(50, Some(0)).progress(), 0.0);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&TransferStatus::AlreadyComplete).unwrap();
        assert_eq!(json, "\"alreadycomplete\"");
        let mode: WriteMode = serde_json::from_str("\"overwrite\"").unwrap();
        assert_eq!(mode, WriteMode::Overwrite);
        assert_eq!(WriteMode::default(), WriteMode::Append);
    }

    #[test]
    fn test_success_statuses() {
        assert!(TransferStatus::Completed.is_success());
        assert!(TransferStatus::AlreadyComplete.is_success());
        assert!(!TransferStatus::Paused.is_success());
        assert!(!TransferStatus::Unsupported.is_success());
        assert!(!TransferStatus::Failed.is_success());
    }

    #[test]
    fn test_default_client_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.chunk_size, 2 * 1024 * 1024);
        assert!(settings.user_agent.starts_with("rdl/"));
        assert!(settings.proxy.is_none());
    }
}
