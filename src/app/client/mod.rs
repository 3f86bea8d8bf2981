//! Shared HTTP transport for provider queries and downloads
//!
//! The core treats "fetch bytes at URL with credentials" as the single
//! injected capability; this module implements it once and both the provider
//! clients and the download executor borrow it. Components:
//! - `config`: HTTP client configuration and building
//! - `http`: request operations with rate limiting and retry
//! - `download`: atomic file downloads with streaming

use std::path::Path;

use url::Url;

// Module declarations
pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::{TransferFailure, TransferStatus};
pub use http::RequestAuth;

use download::DownloadHandler;
use http::HttpHandler;

use crate::errors::{AuthResult, DownloadResult};

/// HTTP client shared by all providers and download workers
#[derive(Debug)]
pub struct FetchClient {
    http_handler: HttpHandler,
}

impl FetchClient {
    /// Creates a client with default configuration
    pub fn new() -> AuthResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    pub fn with_config(config: ClientConfig) -> AuthResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, &config)?;
        Ok(Self { http_handler })
    }

    /// Fetches a raw HTTP response with rate limiting and retry logic
    pub async fn get_response(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
    ) -> DownloadResult<reqwest::Response> {
        self.http_handler.get_response(url, auth).await
    }

    /// Fetches a response body as text
    pub async fn get_text(&self, url: &Url, auth: RequestAuth<'_>) -> DownloadResult<String> {
        self.http_handler.get_text(url, auth).await
    }

    /// Downloads a file to the specified path with atomic rename and
    /// skip-if-present semantics
    pub async fn download_file(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
        destination: &Path,
    ) -> Result<TransferStatus, TransferFailure> {
        DownloadHandler::new(&self.http_handler)
            .download_file(url, auth, destination)
            .await
    }

    /// Access to the underlying `reqwest` client, used for token POSTs
    pub fn raw(&self) -> &reqwest::Client {
        self.http_handler.client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(FetchClient::new().is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = ClientConfig {
            rate_limit_rps: 2,
            ..Default::default()
        };
        assert!(FetchClient::with_config(config).is_ok());
    }
}
