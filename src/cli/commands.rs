//! Command handlers for EOF Fetcher CLI
//!
//! This module implements the main command handlers that coordinate between
//! CLI arguments and the core application functionality.

use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::app::{
    executor, report, requirements, resolver, scan, DataspaceClient, DownloadAuths, ExecutorConfig,
    FetchClient, ProviderKind, RequirementKey,
};
use crate::app::providers::{provider_chain, OrbitSource, Provider};
use crate::auth::{
    dataspace_access_token, dataspace_credential, setup_dataspace_credential, CredentialStore,
};
use crate::cli::{AuthAction, AuthArgs, DownloadArgs, GlobalArgs};
use crate::constants::providers;
use crate::errors::{AppError, ConfigError, Result};

/// Handle the download command
///
/// Runs the full pipeline: collect products or dates, derive requirements,
/// resolve candidates against the provider chain, download, and report.
pub async fn handle_download(args: DownloadArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let preference = args.preference();
    let keys = gather_requirements(&args, preference)?;

    if keys.is_empty() {
        println!("No orbit files needed.");
        return Ok(());
    }
    info!("Derived {} orbit file requirement(s)", keys.len());

    // Provider chain: credentials decide whether CDSE participates
    let store = CredentialStore::load(global.netrc_file.as_deref())?;
    let credential = dataspace_credential(&store);
    let preset_token = dataspace_access_token();
    if credential.is_none() && preset_token.is_none() {
        warn!(
            "No Copernicus credentials found; only the ASF mirror will be queried. \
             Run 'eof_fetcher auth setup' to enable the Data Space."
        );
    }

    let client = Arc::new(FetchClient::new()?);
    let dataspace = DataspaceClient::new(credential, preset_token);
    let chain = provider_chain(Arc::clone(&client), dataspace, args.force_dataspace);

    // Resolve every requirement before any download starts
    let resolution = resolver::resolve_all(&chain, keys).await;
    for key in &resolution.exhausted {
        eprintln!("No orbit file available for {}", key);
    }

    if resolution.resolved.is_empty() {
        let result = report::aggregate(vec![], resolution.exhausted);
        return finish(result, start_time);
    }

    let auths = Arc::new(resolve_download_auths(&chain, &resolution.resolved).await);

    std::fs::create_dir_all(&args.save_dir).map_err(|_| ConfigError::OutputDirUnavailable {
        path: args.save_dir.clone(),
    })?;
    let config = ExecutorConfig::new(args.workers, args.save_dir.clone())?;

    let progress = download_progress(resolution.resolved.len() as u64, global.quiet);
    let outcomes = executor::download_all(
        client,
        &config,
        auths,
        resolution.resolved,
        progress.clone(),
    )
    .await;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let result = report::aggregate(outcomes, resolution.exhausted);
    finish(result, start_time)
}

/// Handle the auth command
pub async fn handle_auth(args: AuthArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        AuthAction::Setup => {
            setup_dataspace_credential(global.netrc_file.as_deref())?;
            Ok(())
        }
        AuthAction::Status => {
            let store = CredentialStore::load(global.netrc_file.as_deref())?;
            let credential = dataspace_credential(&store);
            let token = dataspace_access_token();

            println!("Provider credential status:");
            println!("  {} (anonymous, always available)", providers::ASF_HOST);
            match (&credential, &token) {
                (_, Some(_)) => {
                    println!("  {} (access token from environment)", providers::DATASPACE_HOST)
                }
                (Some(c), None) => {
                    println!("  {} (login '{}')", providers::DATASPACE_HOST, c.login)
                }
                (None, None) => println!(
                    "  {} (no credentials; run 'eof_fetcher auth setup')",
                    providers::DATASPACE_HOST
                ),
            }
            Ok(())
        }
    }
}

/// Collect requirement keys from explicit products, dates, or a directory scan
fn gather_requirements(
    args: &DownloadArgs,
    preference: crate::app::TypePreference,
) -> Result<std::collections::BTreeSet<RequirementKey>> {
    if !args.sentinel_files.is_empty() {
        let mut products = Vec::with_capacity(args.sentinel_files.len());
        for name in &args.sentinel_files {
            products.push(crate::app::Product::parse(name)?);
        }
        return Ok(requirements::from_products(&products, preference));
    }

    if !args.dates.is_empty() {
        let mut dates = Vec::with_capacity(args.dates.len());
        for value in &args.dates {
            dates.push(requirements::parse_date(value)?);
        }
        let missions = requirements::missions_from_filters(&args.missions);
        return Ok(requirements::from_dates(&dates, &missions, preference));
    }

    let products = scan::find_products(&args.search_path)?;
    info!(
        "Found {} product(s) under {}",
        products.len(),
        args.search_path.display()
    );
    let existing = scan::find_existing_orbits(&args.save_dir)?;
    let products = scan::uncovered_products(products, &existing);

    Ok(requirements::from_products(&products, preference))
}

/// Fetch download credentials once, ahead of the worker pool
///
/// Only consults the identity service when a CDSE candidate was actually
/// resolved; a token failure downgrades those downloads to anonymous, which
/// the server will reject visibly.
async fn resolve_download_auths(
    chain: &[Provider],
    resolved: &[crate::app::Candidate],
) -> DownloadAuths {
    let needs_dataspace = resolved
        .iter()
        .any(|c| c.provider == ProviderKind::Dataspace);
    if !needs_dataspace {
        return DownloadAuths::default();
    }

    for provider in chain {
        if provider.kind() == ProviderKind::Dataspace {
            match provider.download_token().await {
                Ok(token) => return DownloadAuths::new(token),
                Err(e) => {
                    warn!(error = %e, "Could not obtain a Data Space access token");
                    return DownloadAuths::default();
                }
            }
        }
    }
    DownloadAuths::default()
}

fn download_progress(total: u64, quiet: bool) -> Option<ProgressBar> {
    if quiet || !atty::is(atty::Stream::Stderr) {
        return None;
    }

    let bar = ProgressBar::new(total);
    // Falls back to the default style if the template is ever invalid
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        bar.set_style(style.progress_chars("#>-"));
    }
    Some(bar)
}

/// Print the batch summary and map partial failure to a process error
fn finish(result: crate::app::BatchResult, start_time: Instant) -> Result<()> {
    println!(
        "Saved {} orbit file(s) in {:.1}s",
        result.saved.len(),
        start_time.elapsed().as_secs_f64()
    );
    for path in &result.saved {
        println!("  {}", path.display());
    }

    for failed in &result.failed {
        eprintln!(
            "Failed: {} ({}{})",
            failed.candidate.file_name,
            failed.error,
            if failed.retries_exhausted {
                ", retries exhausted"
            } else {
                ""
            }
        );
    }

    if result.is_complete() {
        Ok(())
    } else {
        Err(AppError::PartialFailure {
            unresolved: result.unresolved.len(),
            failed: result.failed.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Mission, TypePreference};
    use tempfile::TempDir;

    fn download_args(dir: &TempDir) -> DownloadArgs {
        DownloadArgs {
            search_path: dir.path().to_path_buf(),
            save_dir: dir.path().to_path_buf(),
            sentinel_files: vec![],
            dates: vec![],
            missions: vec![],
            orbit_type: crate::cli::OrbitTypeArg::Precise,
            no_fallback: false,
            force_dataspace: false,
            workers: 3,
        }
    }

    #[test]
    fn test_gather_from_explicit_product() {
        let dir = TempDir::new().unwrap();
        let mut args = download_args(&dir);
        args.sentinel_files = vec![
            "S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70".to_string(),
        ];

        let keys = gather_requirements(&args, TypePreference::default()).unwrap();
        assert_eq!(keys.len(), 1);
        let key = keys.iter().next().unwrap();
        assert_eq!(key.mission, Mission::S1A);
        assert_eq!(key.date.to_string(), "2018-04-07");
    }

    #[test]
    fn test_gather_from_dates_without_filter_fans_out() {
        let dir = TempDir::new().unwrap();
        let mut args = download_args(&dir);
        args.dates = vec!["20180503".to_string()];

        let keys = gather_requirements(&args, TypePreference::default()).unwrap();
        assert_eq!(keys.len(), Mission::ALL.len());
    }

    #[test]
    fn test_gather_from_empty_directory() {
        let dir = TempDir::new().unwrap();
        let args = download_args(&dir);

        let keys = gather_requirements(&args, TypePreference::default()).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_bad_product_name_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut args = download_args(&dir);
        args.sentinel_files = vec!["not_a_product".to_string()];

        assert!(gather_requirements(&args, TypePreference::default()).is_err());
    }
}
