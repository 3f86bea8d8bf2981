//! Command-line argument parsing for EOF Fetcher
//!
//! This module defines the CLI structure using clap derive macros, covering
//! orbit file downloads and credential management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::models::TypePreference;

/// EOF Fetcher - Download Sentinel-1 orbit files
#[derive(Parser, Debug)]
#[command(
    name = "eof_fetcher",
    version,
    about = "Download precise and restituted orbit files for Sentinel-1 products",
    long_about = "Scans Sentinel-1 SAFE products or takes explicit dates, works out which \
orbit files are needed, and downloads them from the ASF mirror or the Copernicus Data Space, \
preferring precise orbits and falling back to restituted ones."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Netrc file to read credentials from (default: ~/.netrc)
    #[arg(long, global = true, value_name = "FILE")]
    pub netrc_file: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download orbit files for products or dates
    Download(DownloadArgs),

    /// Manage provider credentials
    Auth(AuthArgs),
}

/// Orbit type selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitTypeArg {
    /// Precise orbits, falling back to restituted unless pinned
    #[default]
    Precise,
    /// Restituted orbits only
    Restituted,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Directory to scan for Sentinel-1 products
    #[arg(short = 'p', long, default_value = ".", value_name = "DIR")]
    pub search_path: PathBuf,

    /// Directory to save orbit files into
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub save_dir: PathBuf,

    /// Explicit product names or paths instead of scanning
    #[arg(long = "sentinel-file", value_name = "PRODUCT")]
    pub sentinel_files: Vec<String>,

    /// Acquisition dates to fetch orbits for (YYYYMMDD or YYYY-MM-DD)
    #[arg(short, long = "date", value_name = "DATE")]
    pub dates: Vec<String>,

    /// Mission filter for date-based requests (S1A, S1B, S1C)
    #[arg(short, long = "mission", value_name = "MISSION")]
    pub missions: Vec<String>,

    /// Orbit type to download
    #[arg(long, value_enum, default_value = "precise")]
    pub orbit_type: OrbitTypeArg,

    /// Do not fall back to restituted orbits when precise are missing
    #[arg(long)]
    pub no_fallback: bool,

    /// Query the Copernicus Data Space before the ASF mirror
    #[arg(long)]
    pub force_dataspace: bool,

    /// Number of concurrent download workers
    #[arg(short = 'w', long, default_value = "3")]
    pub workers: usize,
}

impl DownloadArgs {
    /// Reject argument combinations no downstream stage can satisfy
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Number of workers must be greater than 0".to_string());
        }

        if !self.dates.is_empty() && !self.sentinel_files.is_empty() {
            return Err("Cannot combine --date with --sentinel-file".to_string());
        }

        Ok(())
    }

    /// Orbit type preference implied by the flags
    pub fn preference(&self) -> TypePreference {
        match (self.orbit_type, self.no_fallback) {
            (OrbitTypeArg::Restituted, _) => TypePreference::RestitutedOnly,
            (OrbitTypeArg::Precise, true) => TypePreference::PreciseOnly,
            (OrbitTypeArg::Precise, false) => TypePreference::PreciseWithFallback,
        }
    }
}

/// Arguments for credential management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Credential management actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store a Copernicus Data Space login in the netrc file
    Setup,

    /// Show which credentials are configured
    Status,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_download_defaults() {
        let cli = parse(&["eof_fetcher", "download"]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.search_path, PathBuf::from("."));
        assert_eq!(args.workers, 3);
        assert!(!args.force_dataspace);
        assert_eq!(args.preference(), TypePreference::PreciseWithFallback);
    }

    #[test]
    fn test_preference_mapping() {
        let cli = parse(&["eof_fetcher", "download", "--orbit-type", "restituted"]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.preference(), TypePreference::RestitutedOnly);

        let cli = parse(&["eof_fetcher", "download", "--no-fallback"]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.preference(), TypePreference::PreciseOnly);
    }

    #[test]
    fn test_date_and_mission_flags_are_singular() {
        let cli = parse(&[
            "eof_fetcher",
            "download",
            "--date",
            "20180503",
            "--mission",
            "S1A",
            "--mission",
            "S1B",
        ]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.dates, vec!["20180503"]);
        assert_eq!(args.missions, vec!["S1A", "S1B"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let cli = parse(&["eof_fetcher", "download", "-w", "0"]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dates_with_explicit_products() {
        let cli = parse(&[
            "eof_fetcher",
            "download",
            "--date",
            "20180503",
            "--sentinel-file",
            "S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70",
        ]);
        let Commands::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let quiet = parse(&["eof_fetcher", "-q", "download"]);
        assert_eq!(quiet.log_level(), tracing::Level::ERROR);

        let verbose = parse(&["eof_fetcher", "-v", "download"]);
        assert_eq!(verbose.log_level(), tracing::Level::INFO);

        let default = parse(&["eof_fetcher", "download"]);
        assert_eq!(default.log_level(), tracing::Level::WARN);
    }
}
