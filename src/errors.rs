//! Error types for EOF Fetcher
//!
//! This module defines error types for all components of the application.
//! The split mirrors the recovery behavior: parse errors are reported
//! per-item, query errors trigger provider fallback, download errors are
//! retried and folded into per-candidate outcomes, and only configuration
//! errors abort the whole invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Product and orbit file name parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Name does not follow the Sentinel-1 naming grammar
    #[error("Invalid Sentinel-1 product name: {name}")]
    InvalidProductName { name: String },

    /// Name does not follow the orbit file naming grammar
    #[error("Invalid orbit file name: {name}")]
    InvalidOrbitName { name: String },

    /// A timestamp segment is not a valid calendar/time value
    #[error("Invalid timestamp '{value}' in {name}")]
    InvalidTimestamp { name: String, value: String },

    /// Unknown mission code
    #[error("Unknown mission identifier: {value}")]
    UnknownMission { value: String },
}

/// Authentication and credential errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credentials available for the given host
    #[error("No credentials found for {host}. Add a netrc entry or set the environment variables")]
    MissingCredentials { host: String },

    /// HTTP request failed while obtaining a token
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// The identity service rejected the credentials
    #[error("Token request rejected for {host}: {reason}")]
    TokenRejected { host: String, reason: String },

    /// Token response did not contain the expected field
    #[error("Malformed token response: missing '{field}'")]
    MalformedTokenResponse { field: String },

    /// I/O error reading or writing the netrc file
    #[error("Failed to access credential file")]
    CredentialStorage(#[from] std::io::Error),

    /// Netrc file has an unparseable entry
    #[error("Malformed netrc entry at {path}: {reason}")]
    MalformedNetrc { path: PathBuf, reason: String },

    /// Interactive input was empty or invalid
    #[error("Invalid credential input: {reason}")]
    InvalidInput { reason: String },
}

/// Provider query errors
///
/// An empty result list is not an error; these variants cover the cases
/// where a provider could not be asked at all.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The provider requires credentials and none were supplied
    #[error("Authentication required for {host}")]
    AuthRequired { host: String },

    /// The backing service is unreachable or returned a server error
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The provider answered with a body we could not interpret
    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },
}

/// Download and HTTP transfer errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Credentials were rejected mid-transfer; never retried
    #[error("Authentication rejected by server: HTTP {status}")]
    AuthRejected { status: u16 },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Body ended before the advertised length
    #[error("Truncated transfer: received {received} bytes, expected {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for download")]
    MaxRetriesExceeded { max_retries: u32 },
}

impl DownloadError {
    /// Auth rejections are surfaced distinctly so the caller can prompt for
    /// new credentials instead of retrying
    pub fn is_auth(&self) -> bool {
        matches!(self, DownloadError::AuthRejected { .. })
    }
}

/// Configuration errors; the only process-fatal kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No providers left after filtering
    #[error("No orbit file providers configured")]
    NoProviders,

    /// Concurrency limit must be at least one
    #[error("Invalid concurrency limit: {value}. Must be between 1 and {max}")]
    InvalidConcurrency { value: usize, max: usize },

    /// Output directory could not be created
    #[error("Cannot create output directory: {path}")]
    OutputDirUnavailable { path: PathBuf },

    /// Mutually exclusive or incomplete CLI options
    #[error("Invalid arguments: {reason}")]
    InvalidArguments { reason: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Product name parsing error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Provider query error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Batch finished but some keys or candidates failed
    #[error("{unresolved} requirement(s) unresolved, {failed} download(s) failed")]
    PartialFailure { unresolved: usize, failed: usize },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Query(QueryError::ProviderUnavailable { .. })
            | AppError::Download(DownloadError::Http(_))
            | AppError::Download(DownloadError::RateLimitExceeded)
            | AppError::Download(DownloadError::Truncated { .. })
            | AppError::Download(DownloadError::ServerError { .. }) => true,

            AppError::Config(_)
            | AppError::Parse(_)
            | AppError::Auth(_)
            | AppError::Download(DownloadError::AuthRejected { .. }) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Parse(_) => "parse",
            AppError::Auth(_) => "authentication",
            AppError::Query(_) => "query",
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::PartialFailure { .. } => "partial",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Parse result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Query result type alias
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = AppError::Query(QueryError::AuthRequired {
            host: "dataspace.copernicus.eu".to_string(),
        });
        assert_eq!(err.category(), "query");

        let err = AppError::Config(ConfigError::NoProviders);
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_recoverability() {
        let transient = AppError::Query(QueryError::ProviderUnavailable {
            provider: "asf".to_string(),
            reason: "connect timeout".to_string(),
        });
        assert!(transient.is_recoverable());

        let fatal = AppError::Config(ConfigError::InvalidConcurrency { value: 0, max: 16 });
        assert!(!fatal.is_recoverable());

        let auth = AppError::Download(DownloadError::AuthRejected { status: 401 });
        assert!(!auth.is_recoverable());
    }

    #[test]
    fn test_auth_rejection_is_distinct() {
        assert!(DownloadError::AuthRejected { status: 403 }.is_auth());
        assert!(!DownloadError::RateLimitExceeded.is_auth());
    }
}
