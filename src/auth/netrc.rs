//! Netrc-backed credential store
//!
//! Providers look up credentials by host identity. The store is read once at
//! startup from the conventional per-user netrc file (or an explicit path)
//! and is immutable afterwards; writes happen only through [`CredentialStore::update`],
//! which the CLI invokes solely when the user opts in with `--update-netrc`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AuthError, AuthResult};

/// A login/secret pair for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub login: String,
    pub password: String,
}

/// Per-user persisted mapping of host to credential
#[derive(Debug, Default)]
pub struct CredentialStore {
    entries: HashMap<String, Credential>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Load the store from an explicit path, `$NETRC`, or `~/.netrc`
    ///
    /// A missing file yields an empty store; only unreadable or malformed
    /// files are errors.
    pub fn load(netrc_file: Option<&Path>) -> AuthResult<Self> {
        let path = match netrc_file {
            Some(path) => Some(path.to_path_buf()),
            None => default_netrc_path(),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self {
                entries: HashMap::new(),
                path: Some(path),
            });
        }

        let contents = fs::read_to_string(&path)?;
        let entries = parse_netrc(&contents).map_err(|reason| AuthError::MalformedNetrc {
            path: path.clone(),
            reason,
        })?;

        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    /// Look up the credential for a host, if present
    pub fn lookup(&self, host: &str) -> Option<&Credential> {
        self.entries.get(host)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace a host entry and persist the whole file with
    /// owner-only permissions
    pub fn update(&mut self, host: &str, credential: Credential) -> AuthResult<()> {
        let Some(path) = self.path.clone() else {
            return Err(AuthError::InvalidInput {
                reason: "No netrc path available to write to".to_string(),
            });
        };

        self.entries.insert(host.to_string(), credential);

        let mut rendered = String::new();
        let mut hosts: Vec<&String> = self.entries.keys().collect();
        hosts.sort();
        for host in hosts {
            let credential = &self.entries[host];
            rendered.push_str(&format!(
                "machine {} login {} password {}\n",
                host, credential.login, credential.password
            ));
        }

        fs::write(&path, rendered)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }
}

fn default_netrc_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("NETRC") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".netrc"))
}

/// Minimal netrc token parser: `machine <host> login <user> password <pass>`
///
/// `account` tokens are skipped; `default` entries and `macdef` blocks are
/// not supported and reported as malformed.
fn parse_netrc(contents: &str) -> std::result::Result<HashMap<String, Credential>, String> {
    let mut entries = HashMap::new();
    let mut tokens = contents.split_whitespace();

    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                let host = tokens.next().ok_or("machine token without a host")?;
                let mut login = None;
                let mut password = None;

                // login/password/account may appear in any order
                while login.is_none() || password.is_none() {
                    match tokens.next() {
                        Some("login") => {
                            login = Some(tokens.next().ok_or("login token without a value")?)
                        }
                        Some("password") => {
                            password = Some(tokens.next().ok_or("password token without a value")?)
                        }
                        Some("account") => {
                            tokens.next().ok_or("account token without a value")?;
                        }
                        _ => break,
                    }
                }

                if let (Some(login), Some(password)) = (login, password) {
                    entries.insert(
                        host.to_string(),
                        Credential {
                            login: login.to_string(),
                            password: password.to_string(),
                        },
                    );
                }
            }
            "default" | "macdef" => {
                return Err(format!("unsupported netrc token: {}", token));
            }
            _ => {}
        }
    }

    Ok(entries)
}
