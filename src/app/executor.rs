//! Bounded download executor
//!
//! Resolved candidates go into a shared queue drained by a fixed pool of
//! workers. Global parallelism is the worker count; on top of that each
//! provider may impose its own connection ceiling, enforced with a
//! per-provider semaphore so a CDSE-heavy batch cannot trip the service's
//! four-connection limit while ASF transfers proceed unthrottled.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use crate::app::client::{FetchClient, TransferStatus};
use crate::app::models::{Candidate, DownloadOutcome, ProviderKind};
use crate::app::providers::DownloadAuths;
use crate::constants::workers;
use crate::errors::ConfigError;

/// Executor settings validated at construction
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of concurrent download workers
    pub worker_count: usize,
    /// Directory downloaded files are saved into
    pub save_dir: PathBuf,
}

impl ExecutorConfig {
    pub fn new(worker_count: usize, save_dir: PathBuf) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: worker_count,
                max: workers::MAX_WORKER_COUNT,
            });
        }
        let worker_count = if worker_count > workers::MAX_WORKER_COUNT {
            warn!(
                requested = worker_count,
                max = workers::MAX_WORKER_COUNT,
                "Clamping worker count"
            );
            workers::MAX_WORKER_COUNT
        } else {
            worker_count
        };
        Ok(Self {
            worker_count,
            save_dir,
        })
    }
}

/// Download every candidate, respecting per-provider connection ceilings
///
/// Outcomes come back in completion order, one per input candidate. The
/// executor never aborts early: a failed transfer is recorded and the next
/// queue entry is picked up.
pub async fn download_all(
    client: Arc<FetchClient>,
    config: &ExecutorConfig,
    auths: Arc<DownloadAuths>,
    candidates: Vec<Candidate>,
    progress: Option<ProgressBar>,
) -> Vec<DownloadOutcome> {
    let total = candidates.len();
    if total == 0 {
        return Vec::new();
    }

    let worker_count = config.worker_count.min(total);
    info!(total, worker_count, "Starting downloads");

    let ceilings = provider_ceilings(worker_count);
    let queue = Arc::new(Mutex::new(candidates.into_iter().collect::<VecDeque<_>>()));
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<DownloadOutcome>(total);

    let mut handles = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let client = Arc::clone(&client);
        let auths = Arc::clone(&auths);
        let queue = Arc::clone(&queue);
        let ceilings = ceilings.clone();
        let outcome_tx = outcome_tx.clone();
        let save_dir = config.save_dir.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let Some(candidate) = queue.lock().await.pop_front() else {
                    debug!(worker_id, "Queue drained, worker exiting");
                    break;
                };

                let outcome =
                    download_one(&client, &auths, &ceilings, &save_dir, candidate).await;
                if outcome_tx.send(outcome).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(outcome_tx);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = outcome_rx.recv().await {
        match &outcome {
            DownloadOutcome::Saved { candidate, path } => {
                info!(file = %candidate.file_name, path = %path.display(), "Saved")
            }
            DownloadOutcome::Skipped { candidate, .. } => {
                debug!(file = %candidate.file_name, "Already present, skipped")
            }
            DownloadOutcome::Failed {
                candidate, error, ..
            } => {
                error!(file = %candidate.file_name, %error, "Download failed")
            }
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
        outcomes.push(outcome);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Download worker panicked");
        }
    }

    outcomes
}

/// One semaphore per provider that publishes a connection ceiling
fn provider_ceilings(worker_count: usize) -> HashMap<ProviderKind, Arc<Semaphore>> {
    let mut ceilings = HashMap::new();
    for kind in [ProviderKind::Asf, ProviderKind::Dataspace] {
        if let Some(max) = kind.max_connections() {
            ceilings.insert(kind, Arc::new(Semaphore::new(max.min(worker_count))));
        }
    }
    ceilings
}

async fn download_one(
    client: &FetchClient,
    auths: &DownloadAuths,
    ceilings: &HashMap<ProviderKind, Arc<Semaphore>>,
    save_dir: &std::path::Path,
    candidate: Candidate,
) -> DownloadOutcome {
    // Permit held for the full transfer, released on drop. The semaphores
    // are never closed, so acquisition can only ever succeed.
    let _permit = match ceilings.get(&candidate.provider) {
        Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
        None => None,
    };

    let destination = save_dir.join(&candidate.file_name);
    let auth = auths.for_provider(candidate.provider);

    match client
        .download_file(&candidate.url, auth, &destination)
        .await
    {
        Ok(TransferStatus::Saved) => DownloadOutcome::Saved {
            candidate,
            path: destination,
        },
        Ok(TransferStatus::AlreadyExists) => DownloadOutcome::Skipped {
            candidate,
            path: destination,
        },
        Err(failure) => DownloadOutcome::Failed {
            candidate,
            error: failure.error,
            retries_exhausted: failure.retries_exhausted,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::ClientConfig;
    use crate::app::models::{Mission, OrbitType, RequirementKey, TypePreference};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use url::Url;

    fn candidate(name: &str, provider: ProviderKind) -> Candidate {
        candidate_at(name, provider, "192.0.2.1")
    }

    fn candidate_at(name: &str, provider: ProviderKind, host: &str) -> Candidate {
        Candidate {
            key: RequirementKey::new(
                Mission::S1A,
                NaiveDate::from_ymd_opt(2018, 4, 7).unwrap(),
                TypePreference::default(),
            ),
            orbit_type: OrbitType::Precise,
            provider,
            // The default host is a TEST-NET-1 address, never routable
            url: Url::parse(&format!("http://{}/{}", host, name)).unwrap(),
            file_name: name.to_string(),
        }
    }

    /// Local server that tracks the peak number of requests in flight,
    /// holding each one open briefly so overlap is observable
    async fn spawn_counting_server(peak: Arc<AtomicUsize>) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    let body = b"orbit state vectors";
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.write_all(body).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });
        addr
    }

    #[test]
    fn test_config_rejects_zero_workers() {
        let err = ExecutorConfig::new(0, PathBuf::from("/tmp")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConcurrency { value: 0, .. }));
    }

    #[test]
    fn test_config_clamps_excess_workers() {
        let config = ExecutorConfig::new(1000, PathBuf::from("/tmp")).unwrap();
        assert_eq!(config.worker_count, workers::MAX_WORKER_COUNT);
    }

    #[test]
    fn test_dataspace_ceiling_bounded_by_workers() {
        let ceilings = provider_ceilings(2);
        assert_eq!(
            ceilings[&ProviderKind::Dataspace].available_permits(),
            2
        );
        assert!(!ceilings.contains_key(&ProviderKind::Asf));

        let ceilings = provider_ceilings(16);
        assert_eq!(ceilings[&ProviderKind::Dataspace].available_permits(), 4);
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let client = Arc::new(FetchClient::new().unwrap());
        let dir = TempDir::new().unwrap();
        let config = ExecutorConfig::new(3, dir.path().to_path_buf()).unwrap();

        let outcomes = download_all(
            client,
            &config,
            Arc::new(DownloadAuths::default()),
            vec![],
            None,
        )
        .await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_existing_files_reported_as_skipped() {
        let client = Arc::new(FetchClient::new().unwrap());
        let dir = TempDir::new().unwrap();
        let config = ExecutorConfig::new(2, dir.path().to_path_buf()).unwrap();

        std::fs::write(dir.path().join("a.EOF"), b"orbit state vectors").unwrap();
        std::fs::write(dir.path().join("b.EOF"), b"orbit state vectors").unwrap();

        let outcomes = download_all(
            client,
            &config,
            Arc::new(DownloadAuths::default()),
            vec![
                candidate("a.EOF", ProviderKind::Asf),
                candidate("b.EOF", ProviderKind::Dataspace),
            ],
            None,
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, DownloadOutcome::Skipped { .. })));
    }

    #[tokio::test]
    async fn test_dataspace_transfers_never_exceed_connection_ceiling() {
        let peak = Arc::new(AtomicUsize::new(0));
        let addr = spawn_counting_server(Arc::clone(&peak)).await;

        // A generous rate limit so only the per-provider semaphore bounds
        // the overlap
        let config = ClientConfig {
            rate_limit_rps: 1000,
            ..Default::default()
        };
        let client = Arc::new(FetchClient::with_config(config).unwrap());
        let dir = TempDir::new().unwrap();
        let exec_config = ExecutorConfig::new(8, dir.path().to_path_buf()).unwrap();

        let candidates: Vec<Candidate> = (0..12)
            .map(|i| {
                candidate_at(
                    &format!("c{:02}.EOF", i),
                    ProviderKind::Dataspace,
                    &addr.to_string(),
                )
            })
            .collect();

        let outcomes = download_all(
            client,
            &exec_config,
            Arc::new(DownloadAuths::default()),
            candidates,
            None,
        )
        .await;

        assert_eq!(outcomes.len(), 12);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, DownloadOutcome::Saved { .. })));

        let ceiling = ProviderKind::Dataspace.max_connections().unwrap();
        assert!(peak.load(Ordering::SeqCst) <= ceiling);
    }
}
