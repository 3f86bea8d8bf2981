//! Core application logic for EOF Fetcher
//!
//! The pipeline runs in stages: scan inputs into products, derive the
//! deduplicated requirement set, resolve each requirement against the
//! provider chain, download the winning candidates through the bounded
//! executor, and fold everything into a batch result.

pub mod client;
pub mod executor;
pub mod models;
pub mod products;
pub mod providers;
pub mod report;
pub mod requirements;
pub mod resolver;
pub mod scan;

// Re-export key types for convenience
pub use client::{ClientConfig, FetchClient, RequestAuth, TransferFailure, TransferStatus};
pub use executor::ExecutorConfig;
pub use models::{
    BatchResult, Candidate, DownloadOutcome, FailedCandidate, Mission, OrbitType, ProviderKind,
    RequirementKey, TypePreference, ValidityWindow,
};
pub use products::{OrbitFile, Product};
pub use providers::{AsfClient, DataspaceClient, DownloadAuths, OrbitSource, Provider};
pub use resolver::{Resolution, ResolutionReport};
