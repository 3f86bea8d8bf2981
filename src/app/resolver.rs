//! Requirement resolution
//!
//! Walks each requirement through its orbit type preference and the provider
//! chain until a candidate is found. Type order is the outer loop: a precise
//! file from any provider beats a restituted file from the first. Provider
//! errors are logged and skipped; only a requirement no source can satisfy
//! ends up exhausted.

use tracing::{debug, info, warn};

use crate::app::models::{Candidate, RequirementKey};
use crate::app::providers::OrbitSource;
use crate::errors::QueryError;

/// Terminal state of one requirement after walking the provider chain
#[derive(Debug)]
pub enum Resolution {
    /// A provider produced a fetchable candidate
    Resolved(Candidate),
    /// Every (type, provider) combination was tried without a hit
    Exhausted(RequirementKey),
}

/// Outcome of resolving a whole batch of requirements
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub resolved: Vec<Candidate>,
    pub exhausted: Vec<RequirementKey>,
}

impl ResolutionReport {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.exhausted.len()
    }
}

/// Resolve a batch of requirements against the provider chain
///
/// Requirements are visited in their natural order (date, then mission) so
/// output and logs are deterministic for a given input set.
pub async fn resolve_all<S, I>(providers: &[S], keys: I) -> ResolutionReport
where
    S: OrbitSource,
    I: IntoIterator<Item = RequirementKey>,
{
    let mut report = ResolutionReport::default();

    for key in keys {
        match resolve_one(providers, &key).await {
            Resolution::Resolved(candidate) => {
                info!(
                    %key,
                    orbit_type = %candidate.orbit_type,
                    provider = %candidate.provider,
                    file = %candidate.file_name,
                    "Resolved orbit file"
                );
                report.resolved.push(candidate);
            }
            Resolution::Exhausted(key) => {
                warn!(%key, "No provider holds a covering orbit file");
                report.exhausted.push(key);
            }
        }
    }

    report
}

/// Walk one requirement through types then providers until a candidate hits
pub async fn resolve_one<S: OrbitSource>(providers: &[S], key: &RequirementKey) -> Resolution {
    let types = key.preference.types();

    for (type_index, &orbit_type) in types.iter().enumerate() {
        if type_index > 0 {
            info!(%key, fallback = %orbit_type, "Falling back to lower orbit type");
        }

        for provider in providers {
            match provider.find(key, orbit_type).await {
                Ok(candidates) => {
                    if let Some(candidate) = candidates.into_iter().next() {
                        return Resolution::Resolved(candidate);
                    }
                    debug!(
                        %key,
                        %orbit_type,
                        provider = %provider.kind(),
                        "Provider has no covering file"
                    );
                }
                Err(QueryError::AuthRequired { host }) => {
                    debug!(
                        %key,
                        provider = %provider.kind(),
                        host,
                        "Skipping provider without credentials"
                    );
                }
                Err(e) => {
                    warn!(
                        %key,
                        %orbit_type,
                        provider = %provider.kind(),
                        error = %e,
                        "Provider query failed, trying next"
                    );
                }
            }
        }
    }

    Resolution::Exhausted(*key)
}
