//! Data models for EOF Fetcher
//!
//! This module defines the core data structures used throughout the
//! application: missions, orbit types, validity windows, requirement keys,
//! download candidates and batch outcomes.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::orbit;
use crate::errors::{ParseError, ParseResult};

/// Sentinel-1 satellite platform identifier
///
/// Parsing is case-insensitive; the canonical form is upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mission {
    S1A,
    S1B,
    S1C,
}

impl Mission {
    /// All supported missions, in canonical order
    pub const ALL: [Mission; 3] = [Mission::S1A, Mission::S1B, Mission::S1C];

    /// Parse a mission code, accepting any letter case
    pub fn parse(value: &str) -> ParseResult<Self> {
        match value.to_ascii_uppercase().as_str() {
            "S1A" => Ok(Mission::S1A),
            "S1B" => Ok(Mission::S1B),
            "S1C" => Ok(Mission::S1C),
            _ => Err(ParseError::UnknownMission {
                value: value.to_string(),
            }),
        }
    }

    /// Canonical mission code
    pub fn as_str(&self) -> &'static str {
        match self {
            Mission::S1A => "S1A",
            Mission::S1B => "S1B",
            Mission::S1C => "S1C",
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality tier of a published orbit file
///
/// Precise files are higher accuracy but published with a multi-day latency;
/// restituted files cover recent dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrbitType {
    Precise,
    Restituted,
}

impl OrbitType {
    /// Auxiliary product type string used by provider catalogues
    pub fn product_type(&self) -> &'static str {
        match self {
            OrbitType::Precise => "AUX_POEORB",
            OrbitType::Restituted => "AUX_RESORB",
        }
    }

    /// Short code embedded in orbit file names
    pub fn code(&self) -> &'static str {
        match self {
            OrbitType::Precise => "POEORB",
            OrbitType::Restituted => "RESORB",
        }
    }

    /// Front margin applied when building a query window for this type
    pub fn start_margin(&self) -> Duration {
        match self {
            OrbitType::Precise => orbit::PRECISE_START_MARGIN,
            OrbitType::Restituted => orbit::RESTITUTED_START_MARGIN,
        }
    }
}

impl fmt::Display for OrbitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrbitType::Precise => f.write_str("precise"),
            OrbitType::Restituted => f.write_str("restituted"),
        }
    }
}

/// Orbit type preference for a resolution run
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypePreference {
    /// Try precise first, fall back to restituted
    #[default]
    PreciseWithFallback,
    /// Pinned to precise only
    PreciseOnly,
    /// Pinned to restituted only
    RestitutedOnly,
}

impl TypePreference {
    /// Orbit types to attempt, in order
    pub fn types(&self) -> &'static [OrbitType] {
        match self {
            TypePreference::PreciseWithFallback => &[OrbitType::Precise, OrbitType::Restituted],
            TypePreference::PreciseOnly => &[OrbitType::Precise],
            TypePreference::RestitutedOnly => &[OrbitType::Restituted],
        }
    }
}

/// Time range over which a product acquisition or orbit file applies
///
/// Timestamps are UTC with second precision. Invariant: start <= stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl ValidityWindow {
    /// Create a window, rejecting inverted ranges
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime) -> ParseResult<Self> {
        if start > stop {
            return Err(ParseError::InvalidTimestamp {
                name: "validity window".to_string(),
                value: format!("start {} after stop {}", start, stop),
            });
        }
        Ok(Self { start, stop })
    }

    /// Whether the window fully contains the given instant
    pub fn covers(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.stop
    }

    /// Window duration in whole seconds
    pub fn duration_secs(&self) -> i64 {
        (self.stop - self.start).num_seconds()
    }
}

/// Deduplicated unit of resolution work: one (mission, reference date) pair
///
/// Ordering is by reference date then mission, which is also the order used
/// for the final batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequirementKey {
    /// UTC calendar date the orbit file must cover
    pub date: NaiveDate,
    /// Satellite platform the file applies to
    pub mission: Mission,
    /// Orbit types to attempt, shared across the invocation
    pub preference: TypePreference,
}

impl RequirementKey {
    pub fn new(mission: Mission, date: NaiveDate, preference: TypePreference) -> Self {
        Self {
            date,
            mission,
            preference,
        }
    }

    /// Reference instant used when matching validity windows
    ///
    /// Late in the day so a covering file spans the whole acquisition day.
    pub fn reference_instant(&self) -> NaiveDateTime {
        self.date
            .and_hms_opt(orbit::DATE_REFERENCE_HOUR, 0, 0)
            .expect("reference hour is a valid time of day")
    }
}

impl fmt::Display for RequirementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mission, self.date)
    }
}

/// Identity of a remote orbit file source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// ASF archive mirror, anonymous access
    Asf,
    /// Copernicus Data Space Ecosystem, bearer-token downloads
    Dataspace,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Asf => "asf",
            ProviderKind::Dataspace => "dataspace",
        }
    }

    /// Host identity used for credential lookups
    pub fn host(&self) -> &'static str {
        match self {
            ProviderKind::Asf => crate::constants::providers::ASF_HOST,
            ProviderKind::Dataspace => crate::constants::providers::DATASPACE_HOST,
        }
    }

    /// Provider-imposed ceiling on concurrent transfers, if any
    pub fn max_connections(&self) -> Option<usize> {
        match self {
            ProviderKind::Asf => None,
            ProviderKind::Dataspace => {
                Some(crate::constants::providers::DATASPACE_MAX_CONNECTIONS)
            }
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved, fetchable reference to a specific remote orbit file
///
/// Immutable once produced by a provider query; consumed exactly once by the
/// download executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Requirement this candidate satisfies
    pub key: RequirementKey,
    /// Orbit type actually matched (may be the fallback type)
    pub orbit_type: OrbitType,
    /// Which provider produced the reference
    pub provider: ProviderKind,
    /// Remote locator for the file contents
    pub url: Url,
    /// File name to save under, as published by the provider
    pub file_name: String,
}

/// Per-candidate result of a download attempt
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Transfer completed and the file was renamed into place
    Saved { candidate: Candidate, path: PathBuf },
    /// A non-empty file already existed at the destination
    Skipped { candidate: Candidate, path: PathBuf },
    /// All attempts failed
    Failed {
        candidate: Candidate,
        error: crate::errors::DownloadError,
        retries_exhausted: bool,
    },
}

impl DownloadOutcome {
    pub fn candidate(&self) -> &Candidate {
        match self {
            DownloadOutcome::Saved { candidate, .. }
            | DownloadOutcome::Skipped { candidate, .. }
            | DownloadOutcome::Failed { candidate, .. } => candidate,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// A candidate whose download ultimately failed, with a printable reason
#[derive(Debug)]
pub struct FailedCandidate {
    pub candidate: Candidate,
    pub error: crate::errors::DownloadError,
    pub retries_exhausted: bool,
}

/// Terminal aggregate for one resolve-and-download invocation
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Successfully saved local paths, deduplicated, ordered by ascending
    /// reference date then mission
    pub saved: Vec<PathBuf>,
    /// Requirement keys never resolved to any candidate
    pub unresolved: Vec<RequirementKey>,
    /// Candidates whose download ultimately failed
    pub failed: Vec<FailedCandidate>,
}

impl BatchResult {
    /// Full success: everything resolved and every transfer landed
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_mission_parse_case_insensitive() {
        assert_eq!(Mission::parse("s1a").unwrap(), Mission::S1A);
        assert_eq!(Mission::parse("S1B").unwrap(), Mission::S1B);
        assert_eq!(Mission::parse("s1C").unwrap(), Mission::S1C);
        assert!(Mission::parse("S2A").is_err());
        assert!(Mission::parse("").is_err());
    }

    #[test]
    fn test_orbit_type_codes() {
        assert_eq!(OrbitType::Precise.product_type(), "AUX_POEORB");
        assert_eq!(OrbitType::Restituted.product_type(), "AUX_RESORB");
        assert_eq!(OrbitType::Precise.code(), "POEORB");
    }

    #[test]
    fn test_preference_order() {
        assert_eq!(
            TypePreference::PreciseWithFallback.types(),
            &[OrbitType::Precise, OrbitType::Restituted]
        );
        assert_eq!(
            TypePreference::RestitutedOnly.types(),
            &[OrbitType::Restituted]
        );
    }

    #[test]
    fn test_validity_window_invariant() {
        let start = date(2018, 4, 7).and_hms_opt(22, 59, 44).unwrap();
        let stop = date(2018, 4, 9).and_hms_opt(0, 59, 44).unwrap();

        let window = ValidityWindow::new(start, stop).unwrap();
        assert!(window.covers(date(2018, 4, 8).and_hms_opt(4, 30, 25).unwrap()));
        assert!(!window.covers(date(2018, 4, 10).and_hms_opt(0, 0, 0).unwrap()));

        assert!(ValidityWindow::new(stop, start).is_err());
    }

    #[test]
    fn test_requirement_key_ordering_by_date_then_mission() {
        let a = RequirementKey::new(Mission::S1B, date(2018, 4, 7), TypePreference::default());
        let b = RequirementKey::new(Mission::S1A, date(2018, 4, 8), TypePreference::default());
        let c = RequirementKey::new(Mission::S1A, date(2018, 4, 7), TypePreference::default());

        let mut keys = vec![a, b, c];
        keys.sort();
        assert_eq!(keys, vec![c, a, b]);
    }

    #[test]
    fn test_reference_instant_is_late_in_day() {
        let key = RequirementKey::new(Mission::S1A, date(2018, 5, 3), TypePreference::default());
        assert_eq!(
            key.reference_instant(),
            date(2018, 5, 3).and_hms_opt(23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_provider_ceilings() {
        assert_eq!(ProviderKind::Dataspace.max_connections(), Some(4));
        assert_eq!(ProviderKind::Asf.max_connections(), None);
    }
}
