//! Credential resolution and interactive setup
//!
//! Resolution order for a provider host: explicit environment overrides,
//! then the netrc store. Anonymous access is a valid outcome for hosts
//! that do not require authentication.

use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::auth::netrc::{Credential, CredentialStore};
use crate::constants::{env, providers};
use crate::errors::{AuthError, AuthResult};

/// Resolve the Copernicus Data Space credential, if any is configured
///
/// Environment variables take precedence over the netrc entry so that CI
/// and one-off shells can override a stored login.
pub fn dataspace_credential(store: &CredentialStore) -> Option<Credential> {
    let env_login = std::env::var(env::CDSE_USERNAME).ok();
    let env_password = std::env::var(env::CDSE_PASSWORD).ok();

    if let (Some(login), Some(password)) = (env_login, env_password) {
        debug!("Using Copernicus credential from environment");
        return Some(Credential { login, password });
    }

    store.lookup(providers::DATASPACE_HOST).cloned()
}

/// A pre-issued access token from the environment, bypassing password auth
pub fn dataspace_access_token() -> Option<String> {
    std::env::var(env::CDSE_ACCESS_TOKEN)
        .ok()
        .filter(|token| !token.is_empty())
}

/// Interactively prompt for a Copernicus login and store it in the netrc file
pub fn setup_dataspace_credential(netrc_file: Option<&Path>) -> AuthResult<()> {
    println!("Copernicus Data Space credential setup");
    println!("Register at: {}", providers::DATASPACE_SIGNUP_URL);
    println!();

    print!("Username (email): ");
    io::stdout().flush()?;
    let mut login = String::new();
    io::stdin().read_line(&mut login)?;
    let login = login.trim().to_string();

    if login.is_empty() {
        return Err(AuthError::InvalidInput {
            reason: "Username cannot be empty".to_string(),
        });
    }

    let password = rpassword::prompt_password("Password: ").map_err(AuthError::CredentialStorage)?;
    if password.is_empty() {
        return Err(AuthError::InvalidInput {
            reason: "Password cannot be empty".to_string(),
        });
    }

    let mut store = CredentialStore::load(netrc_file)?;
    store.update(providers::DATASPACE_HOST, Credential { login, password })?;

    println!("Credential saved for {}", providers::DATASPACE_HOST);
    Ok(())
}
