//! Credential storage and resolution
//!
//! Downloading precise and restituted orbit files from the Copernicus Data
//! Space requires a registered account; the ASF mirror is anonymous. This
//! module reads the per-user netrc file, layers environment overrides on
//! top, and offers an interactive setup path for first-time users.

pub mod credentials;
pub mod netrc;

pub use credentials::{dataspace_access_token, dataspace_credential, setup_dataspace_credential};
pub use netrc::{Credential, CredentialStore};
