//! Core HTTP operations with rate limiting and retry logic
//!
//! All provider traffic funnels through [`HttpHandler`], which applies a
//! shared rate limit and an exponential-backoff retry loop. Authentication
//! failures are never retried; the caller needs new credentials, not
//! patience.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::errors::{AuthError, AuthResult, DownloadError, DownloadResult};

/// Credential presented with a single request
#[derive(Debug, Clone, Copy, Default)]
pub enum RequestAuth<'a> {
    /// Public resource, no credential attached
    #[default]
    Anonymous,
    /// OAuth bearer token
    Bearer(&'a str),
    /// HTTP basic authentication
    Basic { login: &'a str, password: &'a str },
}

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client, taking the rate
    /// limit and retry policy from the configuration
    pub fn new(client: Client, config: &ClientConfig) -> AuthResult<Self> {
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> AuthResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            AuthError::InvalidInput {
                reason: "Rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    /// Fetches an HTTP response with rate limiting and retry logic
    ///
    /// Returns the raw `reqwest::Response` so callers can stream bodies.
    /// Retries transport errors, 429 and 5xx with exponential backoff;
    /// returns `DownloadError::AuthRejected` immediately on 401/403.
    pub async fn get_response(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
    ) -> DownloadResult<reqwest::Response> {
        // Jitter avoids a thundering herd when several workers wake at once
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut retries = 0;
        loop {
            let mut request = self.client.get(url.as_str());
            request = match auth {
                RequestAuth::Anonymous => request,
                RequestAuth::Bearer(token) => request.bearer_auth(token),
                RequestAuth::Basic { login, password } => request.basic_auth(login, Some(password)),
            };

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(DownloadError::AuthRejected {
                            status: status.as_u16(),
                        });
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = self.backoff_delay(retries);
                            tracing::warn!(
                                "Rate limited by server (429). Backing off for {}ms",
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(DownloadError::RateLimitExceeded);
                    }

                    if status.is_server_error() {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = self.backoff_delay(retries);
                            tracing::warn!(
                                "Server error ({}). Backing off for {}ms",
                                status,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(DownloadError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    tracing::debug!("Fetched {} ({})", url, status);
                    return Ok(response);
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = self.backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Request failed after {} retries: {}", self.max_retries, e);
                    return Err(DownloadError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    /// Fetches a response body as text
    pub async fn get_text(&self, url: &Url, auth: RequestAuth<'_>) -> DownloadResult<String> {
        let response = self.get_response(url, auth).await?;
        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Maximum retry attempts shared with the download retry loop
    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(crate) fn backoff_delay(&self, retries: u32) -> Duration {
        self.retry_base_delay * 2_u32.pow(retries)
    }
}
