//! Error types for rdl core

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`TransferError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL or local target (e.g. the path is a directory)
    Configuration,
    /// DNS, connect, TLS or other client-side failure
    Transport,
    /// The server answered, but not in a way we can use
    Protocol,
    /// Opening, seeking or writing the local file failed
    Storage,
    /// The body ended or broke before the declared size was reached
    Stream,
    Internal,
}

/// Errors that can end a transfer
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{} is a directory", .0.display())]
    IsDirectory(PathBuf),

    #[error("Cannot stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("This request is not supported for partial content ({detail})")]
    PartialContentNotSupported { path: PathBuf, detail: String },

    #[error("Server sent more than the declared {total} bytes")]
    Overrun { total: u64 },

    #[error("Storage error on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote end hung up unexpectedly after {written} of {total} bytes")]
    UnexpectedEof { written: u64, total: u64 },

    #[error("Stream error after {written} bytes: {source}")]
    Stream {
        written: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer task panicked: {0}")]
    TaskPanicked(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidUrl(_) | TransferError::IsDirectory(_) | TransferError::Stat { .. } => {
                ErrorKind::Configuration
            }
            TransferError::Network(_) => ErrorKind::Transport,
            TransferError::ServerError { .. }
            | TransferError::PartialContentNotSupported { .. }
            | TransferError::Overrun { .. } => ErrorKind::Protocol,
            TransferError::Storage { .. } => ErrorKind::Storage,
            TransferError::UnexpectedEof { .. } | TransferError::Stream { .. } => ErrorKind::Stream,
            TransferError::TaskPanicked(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TransferError::Network(_)
            | TransferError::UnexpectedEof { .. }
            | TransferError::Stream { .. } => true,
            TransferError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransferError::Storage {
            path: path.into(),
            source,
        }
    }
}

// Allow converting to String for display surfaces
impl From<TransferError> for String {
    fn from(error: TransferError) -> Self {
        error.to_string()
    }
}

/// Errors from [`crate::sample_hash`]
#[derive(Debug, Error)]
pub enum HashError {
    #[error("{} is a directory", .0.display())]
    IsDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
