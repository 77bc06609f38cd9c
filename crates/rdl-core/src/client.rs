//! HTTP client construction

use crate::error::TransferError;
use rdl_types::ClientSettings;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Build the shared HTTP client.
///
/// Only the connect phase is bounded; there is no overall request timeout.
pub fn build_client(settings: &ClientSettings) -> Result<Client, TransferError> {
    let mut builder = Client::builder().user_agent(settings.user_agent.clone());

    if let Some(secs) = settings.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    if let Some(proxy) = settings.proxy.as_deref().filter(|p| !p.is_empty()) {
        debug!("Using proxy {}", proxy);
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_client() {
        assert!(build_client(&ClientSettings::default()).is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_network_error() {
        let settings = ClientSettings {
            proxy: Some("http://proxy.invalid:99999".to_string()),
            ..Default::default()
        };
        let err = build_client(&settings).unwrap_err();
        assert!(matches!(err, TransferError::Network(_)));
    }
}
