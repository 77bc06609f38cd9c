//! Transfer configuration and caller hooks
//!
//! A [`TransferConfig`] is assembled before the transfer starts and then moved
//! into it, so it cannot change while bytes are streaming.

use crate::error::TransferError;
use crate::transfer::TransferOutcome;
use rdl_types::{WriteMode, DEFAULT_CHUNK_SIZE};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::path::PathBuf;
use url::Url;

/// What to download, where to, and how
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub url: Url,
    pub destination: PathBuf,
    pub mode: WriteMode,
    /// Extra request headers; later inserts replace earlier ones
    pub headers: BTreeMap<String, String>,
    /// Maximum number of bytes read from the body per write
    pub chunk_size: NonZeroUsize,
}

impl TransferConfig {
    /// Append-mode config with the default chunk size and no extra headers
    pub fn new(url: &str, destination: impl Into<PathBuf>) -> Result<Self, TransferError> {
        let url = Url::parse(url).map_err(|_| TransferError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            url,
            destination: destination.into(),
            mode: WriteMode::Append,
            headers: BTreeMap::new(),
            chunk_size: default_chunk_size(),
        })
    }

    /// Truncate the destination and download from the first byte
    pub fn overwrite(mut self) -> Self {
        self.mode = WriteMode::Overwrite;
        self
    }

    /// Keep the destination's bytes and resume after them
    pub fn append(mut self) -> Self {
        self.mode = WriteMode::Append;
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

fn default_chunk_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN)
}

pub(crate) type ProgressFn = Box<dyn FnMut(u64, Option<u64>) -> ControlFlow<()> + Send>;
pub(crate) type CompleteFn = Box<dyn FnOnce(&TransferOutcome) + Send>;

/// Optional callbacks run on the transfer task
///
/// Both run synchronously inside the streaming loop, so they should return
/// quickly.
#[derive(Default)]
pub struct TransferHooks {
    pub(crate) progress: Option<ProgressFn>,
    pub(crate) complete: Option<CompleteFn>,
}

impl TransferHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after every write with `(bytes_on_disk, total_size)`.
    /// Returning `ControlFlow::Break(())` pauses the transfer.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(u64, Option<u64>) -> ControlFlow<()> + Send + 'static,
    {
        self.progress = Some(Box::new(f));
        self
    }

    /// Called once with the final outcome, including pauses
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&TransferOutcome) + Send + 'static,
    {
        self.complete = Some(Box::new(f));
        self
    }

    pub(crate) fn progress(&mut self, done: u64, total: Option<u64>) -> ControlFlow<()> {
        match self.progress.as_mut() {
            Some(f) => f(done, total),
            None => ControlFlow::Continue(()),
        }
    }

    pub(crate) fn complete(&mut self, outcome: &TransferOutcome) {
        if let Some(f) = self.complete.take() {
            f(outcome);
        }
    }
}

impl fmt::Debug for TransferHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferHooks")
            .field("progress", &self.progress.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransferConfig::new("http://example.com/file.bin", "file.bin").unwrap();
        assert_eq!(config.mode, WriteMode::Append);
        assert_eq!(config.chunk_size.get(), 2 << 20);
        assert!(config.headers.is_empty());
        assert_eq!(config.destination, PathBuf::from("file.bin"));
    }

    #[test]
    fn test_invalid_url() {
        let err = TransferConfig::new("not a url", "file.bin").unwrap_err();
        assert!(matches!(err, TransferError::InvalidUrl(ref u) if u == "not a url"));
    }

    #[test]
    fn test_header_override_and_mode() {
        let config = TransferConfig::new("http://example.com/f", "f")
            .unwrap()
            .with_header("Authorization", "Bearer a")
            .with_header("Authorization", "Bearer b")
            .overwrite();
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers["Authorization"], "Bearer b");
        assert_eq!(config.mode, WriteMode::Overwrite);
        assert_eq!(config.append().mode, WriteMode::Append);
    }

    #[test]
    fn test_hooks_default_to_continue() {
        let mut hooks = TransferHooks::new();
        assert!(hooks.progress(1, Some(2)).is_continue());

        let mut hooks = TransferHooks::new().on_progress(|done, _| {
            if done >= 10 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(hooks.progress(5, None).is_continue());
        assert!(hooks.progress(10, None).is_break());
    }
}
