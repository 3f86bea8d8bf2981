//! ASF archive mirror provider
//!
//! The Alaska Satellite Facility mirrors all published orbit files behind a
//! plain directory listing per orbit type, with anonymous access. Listings
//! run to tens of thousands of entries and change at most a few times a day,
//! so one fetch is scraped, parsed, and cached both in-process and on disk.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::app::client::{FetchClient, RequestAuth};
use crate::app::models::{Candidate, OrbitType, ProviderKind, RequirementKey};
use crate::app::products::OrbitFile;
use crate::app::providers::select;
use crate::constants::{files, providers};
use crate::errors::{QueryError, QueryResult};

/// Disk-cached listings older than this are refetched
const LISTING_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Client for the anonymous ASF orbit file mirror
#[derive(Debug)]
pub struct AsfClient {
    cache_dir: Option<PathBuf>,
    precise_listing: OnceCell<Vec<String>>,
    restituted_listing: OnceCell<Vec<String>>,
}

impl AsfClient {
    pub fn new() -> Self {
        Self {
            cache_dir: dirs::cache_dir().map(|dir| dir.join(files::CACHE_SUBDIR)),
            precise_listing: OnceCell::new(),
            restituted_listing: OnceCell::new(),
        }
    }

    /// Client without a disk cache, refetching listings every run
    pub fn without_disk_cache() -> Self {
        Self {
            cache_dir: None,
            precise_listing: OnceCell::new(),
            restituted_listing: OnceCell::new(),
        }
    }

    /// Find orbit files covering the requirement's reference instant
    pub async fn find(
        &self,
        client: &FetchClient,
        key: &RequirementKey,
        orbit_type: OrbitType,
    ) -> QueryResult<Vec<Candidate>> {
        let names = self.listing(client, orbit_type).await?;

        let files: Vec<OrbitFile> = names
            .iter()
            .filter_map(|name| OrbitFile::parse(name).ok())
            .filter(|file| file.mission == key.mission)
            .collect();

        let selected = select::select_covering(files, key.reference_instant(), orbit_type);

        selected
            .into_iter()
            .map(|file| {
                let url = listing_url(orbit_type).join(&file.file_name).map_err(|e| {
                    QueryError::MalformedResponse {
                        provider: ProviderKind::Asf.to_string(),
                        reason: format!("bad file url: {}", e),
                    }
                })?;
                Ok(Candidate {
                    key: *key,
                    orbit_type,
                    provider: ProviderKind::Asf,
                    file_name: file.file_name,
                    url,
                })
            })
            .collect()
    }

    /// The cached file-name listing for one orbit type
    async fn listing(
        &self,
        client: &FetchClient,
        orbit_type: OrbitType,
    ) -> QueryResult<&Vec<String>> {
        let cell = match orbit_type {
            OrbitType::Precise => &self.precise_listing,
            OrbitType::Restituted => &self.restituted_listing,
        };

        cell.get_or_try_init(|| self.load_listing(client, orbit_type))
            .await
    }

    async fn load_listing(
        &self,
        client: &FetchClient,
        orbit_type: OrbitType,
    ) -> QueryResult<Vec<String>> {
        if let Some(names) = self.read_cached_listing(orbit_type) {
            debug!(%orbit_type, count = names.len(), "Using cached ASF listing");
            return Ok(names);
        }

        let url = listing_url(orbit_type);
        debug!(%url, "Fetching ASF listing");

        let body = client
            .get_text(&url, RequestAuth::Anonymous)
            .await
            .map_err(|e| QueryError::ProviderUnavailable {
                provider: ProviderKind::Asf.to_string(),
                reason: e.to_string(),
            })?;

        let names = scrape_listing(&body)?;
        self.write_cached_listing(orbit_type, &names);
        Ok(names)
    }

    fn cache_path(&self, orbit_type: OrbitType) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("asf_{}_listing.txt", orbit_type.code().to_lowercase())))
    }

    fn read_cached_listing(&self, orbit_type: OrbitType) -> Option<Vec<String>> {
        let path = self.cache_path(orbit_type)?;
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age > LISTING_MAX_AGE {
            return None;
        }

        let contents = fs::read_to_string(&path).ok()?;
        let names: Vec<String> = contents.lines().map(str::to_string).collect();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    fn write_cached_listing(&self, orbit_type: OrbitType, names: &[String]) {
        let Some(path) = self.cache_path(orbit_type) else {
            return;
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, names.join("\n"))
        };
        if let Err(e) = write() {
            warn!(path = %path.display(), error = %e, "Could not cache ASF listing");
        }
    }
}

impl Default for AsfClient {
    fn default() -> Self {
        Self::new()
    }
}

fn listing_url(orbit_type: OrbitType) -> Url {
    let raw = format!(
        "{}/{}/",
        providers::ASF_BASE_URL,
        match orbit_type {
            OrbitType::Precise => "aux_poeorb",
            OrbitType::Restituted => "aux_resorb",
        }
    );
    // Both components are compile-time constants
    Url::parse(&raw).unwrap_or_else(|_| unreachable!("listing url is static"))
}

/// Pull orbit file names out of a directory listing page
fn scrape_listing(body: &str) -> QueryResult<Vec<String>> {
    let selector = Selector::parse(providers::ASF_EOF_LINK_SELECTOR).map_err(|e| {
        QueryError::MalformedResponse {
            provider: ProviderKind::Asf.to_string(),
            reason: format!("bad selector: {}", e),
        }
    })?;

    let document = Html::parse_document(body);
    let names: Vec<String> = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim_start_matches("./").to_string())
        .filter(|name| !name.contains('/'))
        .collect();

    if names.is_empty() {
        return Err(QueryError::MalformedResponse {
            provider: ProviderKind::Asf.to_string(),
            reason: "listing page contained no orbit file links".to_string(),
        });
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r#"
<html><body><table>
<tr><td><a href="../">Parent Directory</a></td></tr>
<tr><td><a href="S1A_OPER_AUX_POEORB_OPOD_20180425T120000_V20180406T225942_20180408T005942.EOF">S1A_..._.EOF</a></td></tr>
<tr><td><a href="S1B_OPER_AUX_POEORB_OPOD_20180426T110000_V20180406T225942_20180408T005942.EOF">S1B_..._.EOF</a></td></tr>
</table></body></html>
"#;

    #[test]
    fn test_scrape_listing_extracts_eof_names() {
        let names = scrape_listing(LISTING_PAGE).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("S1A_OPER_AUX_POEORB"));
        assert!(names[1].starts_with("S1B_OPER_AUX_POEORB"));
    }

    #[test]
    fn test_scrape_empty_page_is_malformed() {
        assert!(scrape_listing("<html><body></body></html>").is_err());
    }

    #[test]
    fn test_listing_urls() {
        assert_eq!(
            listing_url(OrbitType::Precise).as_str(),
            "https://s1qc.asf.alaska.edu/aux_poeorb/"
        );
        assert_eq!(
            listing_url(OrbitType::Restituted).as_str(),
            "https://s1qc.asf.alaska.edu/aux_resorb/"
        );
    }

    #[test]
    fn test_cache_path_per_orbit_type() {
        let client = AsfClient {
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            precise_listing: OnceCell::new(),
            restituted_listing: OnceCell::new(),
        };
        assert_eq!(
            client.cache_path(OrbitType::Precise).unwrap(),
            PathBuf::from("/tmp/cache/asf_poeorb_listing.txt")
        );
        assert!(client.cache_path(OrbitType::Restituted).is_some());
        assert!(AsfClient::without_disk_cache()
            .cache_path(OrbitType::Precise)
            .is_none());
    }
}
