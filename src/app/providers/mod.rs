//! Orbit file providers
//!
//! Each provider exposes one capability: given a requirement and an orbit
//! type, return the remote files that would satisfy it, best first. The
//! resolver walks providers in priority order and never needs to know how a
//! listing page or an OData catalogue works. Components:
//! - `asf`: anonymous ASF mirror, scraped directory listings
//! - `dataspace`: CDSE OData catalogue with bearer-token downloads
//! - `select`: validity window filtering shared by both

use std::sync::Arc;

use crate::app::client::{FetchClient, RequestAuth};
use crate::app::models::{Candidate, OrbitType, ProviderKind, RequirementKey};
use crate::errors::QueryResult;

pub mod asf;
pub mod dataspace;
pub mod select;

pub use asf::AsfClient;
pub use dataspace::DataspaceClient;

/// A queryable source of orbit file candidates
///
/// The resolver is generic over this trait so tests can drive it with
/// scripted sources instead of live services.
pub trait OrbitSource {
    /// Which provider this source represents
    fn kind(&self) -> ProviderKind;

    /// Candidates covering the requirement's reference instant, best first
    ///
    /// An empty list is a clean miss; errors mean the source could not be
    /// consulted at all.
    fn find(
        &self,
        key: &RequirementKey,
        orbit_type: OrbitType,
    ) -> impl std::future::Future<Output = QueryResult<Vec<Candidate>>> + Send;
}

/// A live provider bound to the shared HTTP client
#[derive(Debug)]
pub enum Provider {
    Asf {
        client: Arc<FetchClient>,
        inner: AsfClient,
    },
    Dataspace {
        client: Arc<FetchClient>,
        inner: DataspaceClient,
    },
}

impl Provider {
    pub fn asf(client: Arc<FetchClient>) -> Self {
        Provider::Asf {
            client,
            inner: AsfClient::new(),
        }
    }

    pub fn dataspace(client: Arc<FetchClient>, inner: DataspaceClient) -> Self {
        Provider::Dataspace { client, inner }
    }

    /// Bearer token for CDSE downloads; `None` for anonymous providers
    pub async fn download_token(&self) -> QueryResult<Option<String>> {
        match self {
            Provider::Asf { .. } => Ok(None),
            Provider::Dataspace { client, inner } => {
                inner.access_token(client).await.map(|t| Some(t.to_string()))
            }
        }
    }
}

impl OrbitSource for Provider {
    fn kind(&self) -> ProviderKind {
        match self {
            Provider::Asf { .. } => ProviderKind::Asf,
            Provider::Dataspace { .. } => ProviderKind::Dataspace,
        }
    }

    async fn find(
        &self,
        key: &RequirementKey,
        orbit_type: OrbitType,
    ) -> QueryResult<Vec<Candidate>> {
        match self {
            Provider::Asf { client, inner } => inner.find(client, key, orbit_type).await,
            Provider::Dataspace { client, inner } => inner.find(client, key, orbit_type).await,
        }
    }
}

/// Build the provider chain in priority order
///
/// The ASF mirror leads by default; `force_dataspace` restores the legacy
/// order with CDSE first.
pub fn provider_chain(
    client: Arc<FetchClient>,
    dataspace: DataspaceClient,
    force_dataspace: bool,
) -> Vec<Provider> {
    let asf = Provider::asf(Arc::clone(&client));
    let cdse = Provider::dataspace(client, dataspace);

    if force_dataspace {
        vec![cdse, asf]
    } else {
        vec![asf, cdse]
    }
}

/// Per-provider request credentials for the download phase
///
/// Resolved once before the executor starts so workers never block on the
/// identity service.
#[derive(Debug, Default)]
pub struct DownloadAuths {
    dataspace_token: Option<String>,
}

impl DownloadAuths {
    pub fn new(dataspace_token: Option<String>) -> Self {
        Self { dataspace_token }
    }

    pub fn for_provider(&self, kind: ProviderKind) -> RequestAuth<'_> {
        match kind {
            ProviderKind::Asf => RequestAuth::Anonymous,
            ProviderKind::Dataspace => self
                .dataspace_token
                .as_deref()
                .map(RequestAuth::Bearer)
                .unwrap_or(RequestAuth::Anonymous),
        }
    }
}
