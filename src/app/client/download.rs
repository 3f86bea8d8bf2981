//! File download operations with atomic writes and streaming
//!
//! Transfers stream to a `.tmp` sibling of the destination and are renamed
//! into place only once the body arrived completely, so an interrupted
//! process never leaves a partial file at a final destination.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::{HttpHandler, RequestAuth};
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// How a single transfer concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// Body downloaded and renamed into place
    Saved,
    /// A non-empty file already existed at the destination
    AlreadyExists,
}

/// A transfer that could not be completed
///
/// `retries_exhausted` distinguishes "kept failing until the retry budget
/// ran out" from errors that abort on the first occurrence, such as an
/// authentication rejection. Callers use it to decide whether a fallback
/// candidate is worth trying.
#[derive(Debug)]
pub struct TransferFailure {
    pub error: DownloadError,
    pub retries_exhausted: bool,
}

impl TransferFailure {
    fn immediate(error: impl Into<DownloadError>) -> Self {
        Self {
            error: error.into(),
            retries_exhausted: false,
        }
    }

    fn exhausted(error: DownloadError) -> Self {
        Self {
            error,
            retries_exhausted: true,
        }
    }
}

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler over the shared HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Downloads a file to the specified path with atomic rename
    ///
    /// A non-empty file already at `destination` is kept as-is and reported
    /// as [`TransferStatus::AlreadyExists`], which makes a re-run of the same
    /// batch idempotent. Transfer failures are retried up to the configured
    /// retry limit and then reported with `retries_exhausted` set;
    /// authentication rejections abort immediately.
    pub async fn download_file(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
        destination: &Path,
    ) -> Result<TransferStatus, TransferFailure> {
        if is_nonempty_file(destination) {
            tracing::info!("{} already exists, skipping download", destination.display());
            return Ok(TransferStatus::AlreadyExists);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TransferFailure::immediate)?;
        }

        let temp_path = temp_path_for(destination);
        let max_retries = self.http_handler.max_retries();

        let mut retries = 0;
        loop {
            match self.download_attempt(url, auth, &temp_path).await {
                Ok(()) => {
                    tokio::fs::rename(&temp_path, destination)
                        .await
                        .map_err(|_e| {
                            TransferFailure::immediate(DownloadError::AtomicOperationFailed {
                                temp_path: temp_path.clone(),
                                final_path: destination.to_path_buf(),
                            })
                        })?;
                    tracing::info!("Saved {}", destination.display());
                    return Ok(TransferStatus::Saved);
                }
                // New credentials are needed; retrying the same token is futile
                Err(e) if e.is_auth() => {
                    remove_quietly(&temp_path).await;
                    return Err(TransferFailure::immediate(e));
                }
                Err(e) if retries < max_retries => {
                    retries += 1;
                    let delay = self.http_handler.backoff_delay(retries);
                    tracing::warn!(
                        "Transfer failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    remove_quietly(&temp_path).await;
                    tracing::error!("Transfer failed after {} retries: {}", max_retries, e);
                    return Err(TransferFailure::exhausted(e));
                }
            }
        }
    }

    /// Stream one attempt into the temporary path, verifying length
    async fn download_attempt(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
        temp_path: &Path,
    ) -> DownloadResult<()> {
        let response = self.http_handler.get_response(url, auth).await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let expected = response.content_length();
        let mut stream = response.bytes_stream();
        let mut file = File::create(temp_path).await?;
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if let Some(expected) = expected {
            if received != expected {
                return Err(DownloadError::Truncated { received, expected });
            }
        }

        Ok(())
    }
}

/// Whether a complete-looking file already occupies the destination
fn is_nonempty_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

/// Temp sibling of the destination, e.g. `foo.EOF` -> `foo.EOF.tmp`
fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(files::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

async fn remove_quietly(path: &Path) {
    if path.exists() {
        let _ = tokio::fs::remove_file(path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn fast_retry_handler(max_retries: u32) -> HttpHandler {
        let config = ClientConfig {
            rate_limit_rps: 1000,
            max_retries,
            retry_base_delay: Duration::from_millis(10),
            ..Default::default()
        };
        let client = config.build_http_client().unwrap();
        HttpHandler::new(client, &config).unwrap()
    }

    /// Local server answering every request with the given status line and
    /// an empty body
    async fn spawn_status_server(status_line: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        status_line
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        Url::parse(&format!("http://{}/orbit.EOF", addr)).unwrap()
    }

    /// Local server that advertises a 100-byte body but closes the
    /// connection after a few bytes
    async fn spawn_truncating_server() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response =
                        "HTTP/1.1 200 OK\r\ncontent-length: 100\r\nconnection: close\r\n\r\npartial";
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        Url::parse(&format!("http://{}/orbit.EOF", addr)).unwrap()
    }

    #[test]
    fn test_temp_path_keeps_full_file_name() {
        let temp = temp_path_for(Path::new("/out/S1A_orbit.EOF"));
        assert_eq!(temp, PathBuf::from("/out/S1A_orbit.EOF.tmp"));
    }

    #[test]
    fn test_nonempty_file_detection() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("file.EOF");
        let empty = dir.path().join("empty.EOF");

        std::fs::write(&existing, b"contents").unwrap();
        std::fs::write(&empty, b"").unwrap();

        assert!(is_nonempty_file(&existing));
        // Zero-byte leftovers do not count as a completed download
        assert!(!is_nonempty_file(&empty));
        assert!(!is_nonempty_file(&dir.path().join("missing.EOF")));
        assert!(!is_nonempty_file(dir.path()));
    }

    #[tokio::test]
    async fn test_existing_file_short_circuits_without_network() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("orbit.EOF");
        std::fs::write(&destination, b"previous run").unwrap();

        let config = ClientConfig::default();
        let client = config.build_http_client().unwrap();
        let http_handler = HttpHandler::new(client, &config).unwrap();
        let handler = DownloadHandler::new(&http_handler);

        // Unroutable URL: only the existence check can make this succeed
        let url = Url::parse("http://192.0.2.1/orbit.EOF").unwrap();
        let status = handler
            .download_file(&url, RequestAuth::Anonymous, &destination)
            .await
            .unwrap();

        assert_eq!(status, TransferStatus::AlreadyExists);
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous run");
    }

    #[tokio::test]
    async fn test_persistent_server_errors_flag_retries_exhausted() {
        let url = spawn_status_server("500 Internal Server Error").await;
        let dir = tempdir().unwrap();
        let destination = dir.path().join("orbit.EOF");

        let http_handler = fast_retry_handler(1);
        let handler = DownloadHandler::new(&http_handler);

        let failure = handler
            .download_file(&url, RequestAuth::Anonymous, &destination)
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            DownloadError::ServerError { status: 500 }
        ));
        assert!(failure.retries_exhausted);
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_auth_rejection_is_not_exhaustion() {
        let url = spawn_status_server("403 Forbidden").await;
        let dir = tempdir().unwrap();
        let destination = dir.path().join("orbit.EOF");

        let http_handler = fast_retry_handler(3);
        let handler = DownloadHandler::new(&http_handler);

        let failure = handler
            .download_file(&url, RequestAuth::Anonymous, &destination)
            .await
            .unwrap_err();

        assert!(failure.error.is_auth());
        assert!(!failure.retries_exhausted);
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_interrupted_transfer_leaves_no_file_behind() {
        let url = spawn_truncating_server().await;
        let dir = tempdir().unwrap();
        let destination = dir.path().join("orbit.EOF");

        let http_handler = fast_retry_handler(0);
        let handler = DownloadHandler::new(&http_handler);

        let failure = handler
            .download_file(&url, RequestAuth::Anonymous, &destination)
            .await
            .unwrap_err();
        assert!(failure.retries_exhausted);

        // Neither the final destination nor the temp sibling may survive
        assert!(!destination.exists());
        assert!(!temp_path_for(&destination).exists());
    }
}
