//! Command-line interface components
//!
//! This module contains CLI-specific code for the EOF Fetcher application,
//! including argument parsing, progress display, and command handlers.

pub mod args;
pub mod commands;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, DownloadArgs, GlobalArgs, OrbitTypeArg,
};
pub use commands::{handle_auth, handle_download};
