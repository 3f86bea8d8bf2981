//! EOF Fetcher CLI application
//!
//! Command-line interface for downloading Sentinel-1 orbit files. Features
//! provider fallback, concurrent downloads, and atomic file writes.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use eof_fetcher::cli::{handle_auth, handle_download, Cli, Commands};
use eof_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(&cli);

    info!("EOF Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Download(args) => handle_download(args, &cli.global).await,
        Commands::Auth(args) => handle_auth(args, &cli.global).await,
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("eof_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
