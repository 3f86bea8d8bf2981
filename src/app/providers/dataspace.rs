//! Copernicus Data Space Ecosystem (CDSE) provider
//!
//! Queries go to the public OData catalogue and need no credentials; the
//! download service behind `$value` requires a bearer token issued by the
//! CDSE identity endpoint. The token is fetched lazily on first use and
//! cached for the lifetime of the client.

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::app::client::{FetchClient, RequestAuth};
use crate::app::models::{Candidate, OrbitType, ProviderKind, RequirementKey};
use crate::app::products::OrbitFile;
use crate::app::providers::select;
use crate::auth::Credential;
use crate::constants::providers;
use crate::errors::{QueryError, QueryResult};

const ODATA_TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S.000Z";
const ODATA_PAGE_SIZE: usize = 50;

/// One catalogue entry from the OData `value` array
#[derive(Debug, Deserialize)]
struct CatalogueEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    value: Vec<CatalogueEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the CDSE orbit file catalogue and download service
#[derive(Debug)]
pub struct DataspaceClient {
    credential: Option<Credential>,
    preset_token: Option<String>,
    token: OnceCell<String>,
}

impl DataspaceClient {
    /// Build a client from whatever credential material is configured
    ///
    /// `preset_token` wins over a login/password pair; both absent means the
    /// provider will refuse queries with [`QueryError::AuthRequired`] so the
    /// resolver can move on.
    pub fn new(credential: Option<Credential>, preset_token: Option<String>) -> Self {
        Self {
            credential,
            preset_token,
            token: OnceCell::new(),
        }
    }

    /// Whether any credential material is available for downloads
    pub fn has_credentials(&self) -> bool {
        self.credential.is_some() || self.preset_token.is_some()
    }

    /// Find orbit files covering the requirement's reference instant
    ///
    /// Candidates come back best first; an empty list means the catalogue
    /// holds no covering file of this type yet.
    pub async fn find(
        &self,
        client: &FetchClient,
        key: &RequirementKey,
        orbit_type: OrbitType,
    ) -> QueryResult<Vec<Candidate>> {
        if !self.has_credentials() {
            return Err(QueryError::AuthRequired {
                host: providers::DATASPACE_HOST.to_string(),
            });
        }

        let url = self.query_url(key, orbit_type)?;
        debug!(%key, %orbit_type, "Querying CDSE catalogue");

        let body = client
            .get_text(&url, RequestAuth::Anonymous)
            .await
            .map_err(|e| QueryError::ProviderUnavailable {
                provider: ProviderKind::Dataspace.to_string(),
                reason: e.to_string(),
            })?;

        let response: CatalogueResponse =
            serde_json::from_str(&body).map_err(|e| QueryError::MalformedResponse {
                provider: ProviderKind::Dataspace.to_string(),
                reason: e.to_string(),
            })?;

        let mut files = Vec::new();
        let mut ids = std::collections::HashMap::new();
        for entry in response.value {
            match OrbitFile::parse(&entry.name) {
                Ok(file) if file.mission == key.mission => {
                    ids.insert(file.file_name.clone(), entry.id);
                    files.push(file);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(name = %entry.name, error = %e, "Skipping unparsable catalogue entry")
                }
            }
        }

        let selected = select::select_covering(files, key.reference_instant(), orbit_type);

        selected
            .into_iter()
            .filter_map(|file| {
                let id = ids.get(&file.file_name)?;
                let url = format!(
                    "{}({})/$value",
                    providers::DATASPACE_DOWNLOAD_URL,
                    id
                );
                Some((file, url))
            })
            .map(|(file, url)| {
                let url = Url::parse(&url).map_err(|e| QueryError::MalformedResponse {
                    provider: ProviderKind::Dataspace.to_string(),
                    reason: format!("bad download url: {}", e),
                })?;
                Ok(Candidate {
                    key: *key,
                    orbit_type,
                    provider: ProviderKind::Dataspace,
                    file_name: file.file_name,
                    url,
                })
            })
            .collect()
    }

    /// The bearer token for download requests, fetching and caching it on
    /// first use
    pub async fn access_token(&self, client: &FetchClient) -> QueryResult<&str> {
        if let Some(token) = &self.preset_token {
            return Ok(token);
        }

        let credential = self.credential.as_ref().ok_or(QueryError::AuthRequired {
            host: providers::DATASPACE_HOST.to_string(),
        })?;

        self.token
            .get_or_try_init(|| request_token(client, credential))
            .await
            .map(String::as_str)
    }

    fn query_url(&self, key: &RequirementKey, orbit_type: OrbitType) -> QueryResult<Url> {
        let reference = key.reference_instant();
        let required = select::required_window(reference, orbit_type);

        let filter = format!(
            "Collection/Name eq 'SENTINEL-1' \
             and Attributes/OData.CSC.StringAttribute/any(\
             att:att/Name eq 'productType' \
             and att/OData.CSC.StringAttribute/Value eq '{}') \
             and ContentDate/Start lt '{}' \
             and ContentDate/End gt '{}' \
             and startswith(Name,'{}')",
            orbit_type.product_type(),
            required.start.format(ODATA_TIME_FMT),
            required.stop.format(ODATA_TIME_FMT),
            key.mission,
        );

        Url::parse_with_params(
            providers::DATASPACE_QUERY_URL,
            &[
                ("$filter", filter.as_str()),
                ("$orderby", "ContentDate/Start asc"),
                ("$top", &ODATA_PAGE_SIZE.to_string()),
            ],
        )
        .map_err(|e| QueryError::MalformedResponse {
            provider: ProviderKind::Dataspace.to_string(),
            reason: format!("bad query url: {}", e),
        })
    }
}

/// Exchange a login/password pair for a CDSE access token
async fn request_token(client: &FetchClient, credential: &Credential) -> QueryResult<String> {
    debug!(host = providers::DATASPACE_HOST, "Requesting access token");

    let response = client
        .raw()
        .post(providers::DATASPACE_AUTH_URL)
        .form(&[
            ("client_id", providers::DATASPACE_CLIENT_ID),
            ("grant_type", "password"),
            ("username", &credential.login),
            ("password", &credential.password),
        ])
        .send()
        .await
        .map_err(|e| QueryError::ProviderUnavailable {
            provider: ProviderKind::Dataspace.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(QueryError::AuthRequired {
            host: providers::DATASPACE_HOST.to_string(),
        });
    }

    let token: TokenResponse =
        response
            .json()
            .await
            .map_err(|e| QueryError::MalformedResponse {
                provider: ProviderKind::Dataspace.to_string(),
                reason: format!("token response: {}", e),
            })?;

    if token.access_token.is_empty() {
        return Err(QueryError::MalformedResponse {
            provider: ProviderKind::Dataspace.to_string(),
            reason: "empty access_token".to_string(),
        });
    }

    Ok(token.access_token)
}
