//! Catalog backed by a remote catalog service.
//!
//! The service speaks JSON over HTTP:
//!
//! | Request | Response |
//! |---|---|
//! | `GET {base}/packages[?continuation=T][&prefix=P]` | `{ "packages": [Entry], "continuation": T or null }` |
//! | `GET {base}/packages/{id}/{version}` | `Entry`, or 404 |
//! | `GET {base}/packages/{id}/{version}/archive` | archive bytes, or 404 |
//! | `PUT {base}/packages` (archive body) | 201 with `Entry`, or 409 if it exists |
//! | `DELETE {base}/packages/{id}/{version}` | 204, or 404 |
//!
//! Listings follow continuation tokens until the service stops returning
//! one. A token the service already handed out means the listing cycles and
//! the catalog is reported unavailable. A constraint pinning one exact
//! version is answered with a point lookup instead of a listing, except under
//! [`VersionOrdering::ZeroPadded`] where `1.0` must also find `1.0.0`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tote_core::config::ServiceConfig;
use tote_core::package::ids_match;
use tote_core::{Constraint, PackageRecord, Version, VersionOrdering};
use tote_util::errors::{ToteError, ToteResult};

use crate::{archive, query, Catalog};

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Status and body of one service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ServiceResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response channel to a catalog service.
///
/// Implementations report unreachable services and exhausted retries as
/// [`ToteError::CatalogUnavailable`]; any HTTP status is returned as a
/// response.
pub trait ServiceTransport: Send + Sync {
    fn get(&self, url: &str) -> ToteResult<ServiceResponse>;
    fn put(&self, url: &str, body: Vec<u8>) -> ToteResult<ServiceResponse>;
    fn delete(&self, url: &str) -> ToteResult<ServiceResponse>;
}

/// [`ServiceTransport`] over `reqwest`'s blocking client, with a request
/// timeout, bearer authentication, and retries on connection failures,
/// timeouts, and server errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    catalog: String,
    token: Option<String>,
    retries: u32,
}

impl HttpTransport {
    pub fn new(catalog: impl Into<String>, config: &ServiceConfig) -> ToteResult<Self> {
        let catalog = catalog.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToteError::CatalogUnavailable {
                catalog: catalog.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            catalog,
            token: config.token.clone(),
            retries: config.retries.max(1),
        })
    }

    fn send(
        &self,
        url: &str,
        build: impl Fn() -> reqwest::blocking::RequestBuilder,
    ) -> ToteResult<ServiceResponse> {
        let mut last_err = String::new();

        for attempt in 0..self.retries {
            if attempt > 0 {
                std::thread::sleep(RETRY_DELAY * attempt);
            }

            let mut request = build();
            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            match request.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        tracing::debug!("attempt {} failed: {last_err}", attempt + 1);
                        continue;
                    }
                    let body = resp.bytes().map_err(|e| ToteError::CatalogUnavailable {
                        catalog: self.catalog.clone(),
                        message: format!("failed to read response from {url}: {e}"),
                    })?;
                    return Ok(ServiceResponse::new(status.as_u16(), body.to_vec()));
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = e.to_string();
                    tracing::debug!("attempt {} failed: {last_err}", attempt + 1);
                }
                Err(e) => {
                    return Err(ToteError::CatalogUnavailable {
                        catalog: self.catalog.clone(),
                        message: format!("request to {url} failed: {e}"),
                    });
                }
            }
        }

        Err(ToteError::CatalogUnavailable {
            catalog: self.catalog.clone(),
            message: format!("failed after {} attempts for {url}: {last_err}", self.retries),
        })
    }
}

impl ServiceTransport for HttpTransport {
    fn get(&self, url: &str) -> ToteResult<ServiceResponse> {
        self.send(url, || self.client.get(url))
    }

    fn put(&self, url: &str, body: Vec<u8>) -> ToteResult<ServiceResponse> {
        self.send(url, || {
            self.client
                .put(url)
                .header(reqwest::header::CONTENT_TYPE, "application/zip")
                .body(body.clone())
        })
    }

    fn delete(&self, url: &str) -> ToteResult<ServiceResponse> {
        self.send(url, || self.client.delete(url))
    }
}

/// One package as described by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Entry {
    pub fn from_record(record: &PackageRecord) -> Self {
        Self {
            id: record.id.clone(),
            version: record.version.to_string(),
            description: record.description.clone(),
            dependencies: record.dependencies.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn into_record(self) -> ToteResult<PackageRecord> {
        let mut record = PackageRecord::new(self.id, Version::parse(&self.version)?);
        record.description = self.description;
        record.dependencies = self
            .dependencies
            .iter()
            .map(|d| Constraint::parse(d))
            .collect::<ToteResult<_>>()?;
        Ok(record)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub packages: Vec<Entry>,
    #[serde(default)]
    pub continuation: Option<String>,
}

/// Catalog served by a remote catalog service.
pub struct ServiceCatalog {
    base: Url,
    location: String,
    name: Option<String>,
    transport: Box<dyn ServiceTransport>,
}

impl std::fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("location", &self.location)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ServiceCatalog {
    /// A catalog at `base` using an arbitrary transport.
    pub fn new(base: &str, transport: Box<dyn ServiceTransport>) -> ToteResult<Self> {
        let location = base.trim_end_matches('/').to_string();
        let base = Url::parse(&format!("{location}/")).map_err(|e| ToteError::Config {
            message: format!("Invalid catalog service URL '{location}': {e}"),
        })?;
        if base.cannot_be_a_base() {
            return Err(ToteError::Config {
                message: format!("Catalog service URL '{location}' cannot carry paths"),
            });
        }
        Ok(Self {
            base,
            location,
            name: None,
            transport,
        })
    }

    /// A catalog at `base` over HTTP, configured from `[service]`.
    pub fn connect(base: &str, config: &ServiceConfig) -> ToteResult<Self> {
        let transport = HttpTransport::new(base.trim_end_matches('/'), config)?;
        Self::new(base, Box::new(transport))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.push("packages");
            path.extend(segments);
        }
        url
    }

    fn unexpected(&self, response: &ServiceResponse, what: &str) -> ToteError {
        let message = format!(
            "{what}: HTTP {} {}",
            response.status,
            String::from_utf8_lossy(&response.body).trim()
        );
        if response.status >= 500 {
            ToteError::CatalogUnavailable {
                catalog: self.name().to_string(),
                message,
            }
        } else {
            ToteError::Generic {
                message: format!("catalog '{}' {message}", self.name()),
            }
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, response: &ServiceResponse) -> ToteResult<T> {
        serde_json::from_slice(&response.body).map_err(|e| ToteError::CatalogUnavailable {
            catalog: self.name().to_string(),
            message: format!("malformed response: {e}"),
        })
    }

    fn to_record(&self, entry: Entry) -> Option<PackageRecord> {
        let label = format!("{} {}", entry.id, entry.version);
        match entry.into_record() {
            Ok(record) => Some(record.with_source(self.name())),
            Err(e) => {
                tracing::warn!("ignoring malformed entry {label} from {}: {e}", self.name());
                None
            }
        }
    }

    /// Every listed record, optionally restricted to ids starting with `prefix`.
    pub fn list(&self, prefix: Option<&str>) -> ToteResult<Vec<PackageRecord>> {
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0u32;

        loop {
            let mut url = self.url(&[]);
            if continuation.is_some() || prefix.is_some() {
                let mut params = url.query_pairs_mut();
                if let Some(ref token) = continuation {
                    params.append_pair("continuation", token);
                }
                if let Some(prefix) = prefix {
                    params.append_pair("prefix", prefix);
                }
            }

            let response = self.transport.get(url.as_str())?;
            if !response.is_success() {
                return Err(self.unexpected(&response, "listing failed"));
            }
            let page: Page = self.decode(&response)?;
            pages += 1;
            records.extend(page.packages.into_iter().filter_map(|e| self.to_record(e)));

            match page.continuation.filter(|t| !t.is_empty()) {
                Some(next) if !seen.insert(next.clone()) => {
                    return Err(ToteError::CatalogUnavailable {
                        catalog: self.name().to_string(),
                        message: format!(
                            "listing cycles: continuation token '{next}' returned again after {pages} pages"
                        ),
                    });
                }
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        tracing::debug!("listed {} records from {} in {pages} pages", records.len(), self.name());
        Ok(records)
    }

    /// Point lookup of one exact id and version.
    pub fn lookup(&self, id: &str, version: &Version) -> ToteResult<Option<PackageRecord>> {
        let url = self.url(&[id, version.as_str()]);
        let response = self.transport.get(url.as_str())?;
        match response.status {
            404 => Ok(None),
            _ if response.is_success() => {
                let entry: Entry = self.decode(&response)?;
                Ok(self.to_record(entry))
            }
            _ => Err(self.unexpected(&response, "lookup failed")),
        }
    }
}

impl Catalog for ServiceCatalog {
    fn location(&self) -> &str {
        &self.location
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }

    fn all_records(&self) -> ToteResult<Vec<PackageRecord>> {
        let mut records = self.list(None)?;
        query::sort_ascending(&mut records);
        Ok(records)
    }

    fn records_with_id(&self, id: &str) -> ToteResult<Vec<PackageRecord>> {
        Ok(query::with_id(self.list(Some(id))?, id))
    }

    fn get_with(
        &self,
        constraint: &Constraint,
        ordering: VersionOrdering,
    ) -> ToteResult<Option<PackageRecord>> {
        if let Some(version) = constraint.pinned_version() {
            if ordering == VersionOrdering::LengthBiased {
                let found = self.lookup(constraint.id(), version)?;
                return Ok(found.filter(|r| {
                    ids_match(constraint.id(), &r.id) && constraint.matches_with(&r.version, ordering)
                }));
            }
        }
        let candidates = self.records_with_id(constraint.id())?;
        Ok(query::best_match_with(candidates, constraint, ordering))
    }

    fn fetch(&self, constraint: &Constraint, dest: &Path) -> ToteResult<Option<PathBuf>> {
        let Some(record) = self.get(constraint)? else {
            return Ok(None);
        };
        let url = self.url(&[&record.id, record.version.as_str(), "archive"]);
        let response = self.transport.get(url.as_str())?;
        if response.status == 404 {
            tracing::warn!("{} lists {record} but has no archive for it", self.name());
            return Ok(None);
        }
        if !response.is_success() {
            return Err(self.unexpected(&response, "archive download failed"));
        }
        tote_util::fs::ensure_dir(dest)?;
        let target = dest.join(record.archive_file_name());
        std::fs::write(&target, &response.body)?;
        tracing::debug!(
            "fetched {record} to {} (sha256 {})",
            target.display(),
            tote_util::hash::sha256_bytes(&response.body)
        );
        Ok(Some(target))
    }

    fn push(&self, archive_path: &Path) -> ToteResult<Option<PackageRecord>> {
        let record = archive::read_record(archive_path)?;
        let body = std::fs::read(archive_path)?;
        let response = self.transport.put(self.url(&[]).as_str(), body)?;
        match response.status {
            409 => {
                tracing::info!("{record} already exists in {}", self.name());
                Ok(None)
            }
            _ if response.is_success() => {
                let created = match serde_json::from_slice::<Entry>(&response.body) {
                    Ok(entry) => self.to_record(entry).unwrap_or(record),
                    Err(_) => record,
                };
                tracing::info!("pushed {created} to {}", self.name());
                Ok(Some(created.with_source(self.name())))
            }
            _ => Err(self.unexpected(&response, "push failed")),
        }
    }

    fn yank(&self, constraint: &Constraint) -> ToteResult<bool> {
        let Some(record) = self.get(constraint)? else {
            return Ok(false);
        };
        let url = self.url(&[&record.id, record.version.as_str()]);
        let response = self.transport.delete(url.as_str())?;
        match response.status {
            404 => Ok(false),
            _ if response.is_success() => {
                tracing::info!("yanked {record} from {}", self.name());
                Ok(true)
            }
            _ => Err(self.unexpected(&response, "yank failed")),
        }
    }
}
