//! Application constants for EOF Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for provider credentials
pub mod env {
    /// Environment variable name for the Copernicus Data Space username
    pub const CDSE_USERNAME: &str = "CDSE_USERNAME";

    /// Environment variable name for the Copernicus Data Space password
    pub const CDSE_PASSWORD: &str = "CDSE_PASSWORD";

    /// Environment variable name for a pre-generated CDSE access token
    pub const CDSE_ACCESS_TOKEN: &str = "CDSE_ACCESS_TOKEN";
}

/// Provider hosts and service endpoints
pub mod providers {
    /// Host identity used for netrc lookups of CDSE credentials
    pub const DATASPACE_HOST: &str = "dataspace.copernicus.eu";

    /// URL endpoint for the CDSE OData product query service
    pub const DATASPACE_QUERY_URL: &str =
        "https://catalogue.dataspace.copernicus.eu/odata/v1/Products";

    /// URL endpoint for obtaining a CDSE access token
    pub const DATASPACE_AUTH_URL: &str =
        "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

    /// URL endpoint for the CDSE download service; the product id is
    /// interpolated as `{url}({id})/$value`
    pub const DATASPACE_DOWNLOAD_URL: &str =
        "https://zipper.dataspace.copernicus.eu/odata/v1/Products";

    /// Where users can register for a CDSE account
    pub const DATASPACE_SIGNUP_URL: &str = "https://dataspace.copernicus.eu/";

    /// OAuth client id expected by the CDSE identity service
    pub const DATASPACE_CLIENT_ID: &str = "cdse-public";

    /// CDSE rejects more than four concurrent download connections with 429
    pub const DATASPACE_MAX_CONNECTIONS: usize = 4;

    /// Host serving the public ASF orbit file listings
    pub const ASF_HOST: &str = "s1qc.asf.alaska.edu";

    /// Base URL for the ASF orbit archive mirror
    pub const ASF_BASE_URL: &str = "https://s1qc.asf.alaska.edu";

    /// CSS selector for orbit file links on ASF listing pages
    pub const ASF_EOF_LINK_SELECTOR: &str = "a[href$='.EOF']";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("EOF-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for provider requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;

    /// Maximum retry attempts for failed transfers
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// Orbit timing constants used to build query windows
pub mod orbit {
    use super::Duration;

    /// Orbital period of Sentinel-1 in seconds (175 orbits per 12 days)
    pub const T_ORBIT_SECS: f64 = (12.0 * 86400.0) / 175.0;

    /// Front margin for precise orbit queries: one full orbit plus a minute,
    /// so the file covers the ascending node crossing of the acquisition
    pub const PRECISE_START_MARGIN: Duration = Duration::from_secs((T_ORBIT_SECS + 60.0) as u64);

    /// Front margin for restituted orbit queries
    pub const RESTITUTED_START_MARGIN: Duration = Duration::from_secs(60);

    /// Back margin applied to the end of every query window
    pub const STOP_MARGIN: Duration = Duration::from_secs(60);

    /// Days to shift a product start time backwards when deriving the
    /// reference date; the orbit state vectors needed for processing precede
    /// the acquisition itself
    pub const PRODUCT_DATE_MARGIN_DAYS: i64 = 1;

    /// Hour of day used as the reference instant for date-only requirements,
    /// chosen late so the orbit file covers the whole acquisition day
    pub const DATE_REFERENCE_HOUR: u32 = 23;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Extension of downloaded orbit files
    pub const EOF_EXTENSION: &str = "EOF";

    /// App-specific directory under the user cache dir for listing caches
    pub const CACHE_SUBDIR: &str = "eof_fetcher";
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of concurrent download workers
    pub const DEFAULT_WORKER_COUNT: usize = 3;

    /// Maximum recommended concurrent workers
    pub const MAX_WORKER_COUNT: usize = 16;
}

// Re-export commonly used constants for convenience
pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use workers::DEFAULT_WORKER_COUNT;
