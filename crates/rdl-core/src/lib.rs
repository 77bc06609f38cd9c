//! rdl Core - Resumable Download Engine
//!
//! This crate provides the core download functionality for rdl.
//! It runs single-stream HTTP downloads that resume from partially written
//! files, and a sampling hash for fingerprinting the results.

mod client;
mod error;
mod hash;
mod transfer;

pub use client::*;
pub use error::*;
pub use hash::*;
pub use transfer::*;

use rdl_types::ClientSettings;
use reqwest::Client;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;

/// Entry point: a configured HTTP client that starts transfers
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    settings: ClientSettings,
}

impl Downloader {
    /// Create a new downloader from client settings
    pub fn new(settings: ClientSettings) -> Result<Self, TransferError> {
        let client = build_client(&settings)?;
        Ok(Self { client, settings })
    }

    /// Use an existing client
    pub fn with_client(client: Client, settings: ClientSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Append-mode config using the configured default chunk size
    pub fn config(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<TransferConfig, TransferError> {
        let config = TransferConfig::new(url, destination)?;
        Ok(match NonZeroUsize::new(self.settings.chunk_size) {
            Some(chunk_size) => config.with_chunk_size(chunk_size),
            None => config,
        })
    }

    /// Spawn a transfer. Must be called within a tokio runtime.
    pub fn start(&self, config: TransferConfig, hooks: TransferHooks) -> TransferHandle {
        let transfer = Transfer::new(self.client.clone(), config, hooks);
        info!("Starting transfer {}", transfer.id());
        transfer.start()
    }

    /// Run a transfer on the current task
    pub async fn run(&self, config: TransferConfig, hooks: TransferHooks) -> TransferOutcome {
        Transfer::new(self.client.clone(), config, hooks).run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_uses_settings_chunk_size() {
        let downloader = Downloader::new(ClientSettings {
            chunk_size: 4096,
            ..Default::default()
        })
        .unwrap();
        let config = downloader.config("http://example.com/a", "a").unwrap();
        assert_eq!(config.chunk_size.get(), 4096);
    }

    #[test]
    fn test_zero_chunk_size_falls_back_to_default() {
        let downloader = Downloader::new(ClientSettings {
            chunk_size: 0,
            ..Default::default()
        })
        .unwrap();
        let config = downloader.config("http://example.com/a", "a").unwrap();
        assert_eq!(config.chunk_size.get(), rdl_types::DEFAULT_CHUNK_SIZE);
    }
}
