//! EOF Fetcher Library
//!
//! A Rust library for finding and downloading Sentinel-1 precise (POEORB)
//! and restituted (RESORB) orbit files. Supports multiple providers with
//! automatic fallback, concurrent rate-limited downloads, and atomic writes.

pub mod app;
pub mod auth;
pub mod cli;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_WORKER_COUNT, 3);
        assert_eq!(MAX_RETRIES, 3);
        assert!(USER_AGENT.contains("EOF-Fetcher"));
    }

    #[test]
    fn test_error_types() {
        let config_error = errors::ConfigError::NoProviders;
        let app_error = AppError::Config(config_error);

        assert_eq!(app_error.category(), "config");
        assert!(!app_error.is_recoverable());
    }
}
