use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tote_util::errors::{ToteError, ToteResult};

use crate::version::VersionOrdering;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "Tote.toml";

/// Configuration loaded from `Tote.toml`.
///
/// Catalogs are consulted in the order they appear in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToteConfig {
    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<CatalogSpec>,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub service: ServiceConfig,
}

/// Physical backing store of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// A local directory of package archives.
    Directory,
    /// A paginated remote catalog service.
    Service,
    /// A static XML feed document.
    Feed,
}

/// One configured catalog from `[[catalog]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSpec {
    pub kind: CatalogKind,
    pub location: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CatalogSpec {
    /// Guess the catalog kind from a bare location.
    ///
    /// `http://` and `https://` are services, `*.xml` files are feeds, and
    /// anything else is a directory.
    pub fn infer(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        let kind = if lower.starts_with("http://") || lower.starts_with("https://") {
            CatalogKind::Service
        } else if lower.ends_with(".xml") {
            CatalogKind::Feed
        } else {
            CatalogKind::Directory
        };
        Self {
            kind,
            location: location.to_string(),
            name: None,
        }
    }

    /// Name shown to users: the configured name, else the location.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }
}

/// What the resolver does when two versions of one id meet in a closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiamondPolicy {
    /// Keep both versions.
    #[default]
    Allow,
    /// Fail resolution with a conflict report.
    Reject,
}

/// What the resolver does when a catalog cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailablePolicy {
    /// Abort the whole resolution.
    #[default]
    Abort,
    /// Log a warning and consult the next catalog.
    Skip,
}

/// Resolver settings from `[resolver]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub diamond: DiamondPolicy,
    #[serde(default)]
    pub unavailable: UnavailablePolicy,
    #[serde(default, rename = "version-ordering")]
    pub version_ordering: VersionOrdering,
}

/// Remote service settings from `[service]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            token: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

impl ToteConfig {
    /// Parse configuration from TOML text.
    pub fn parse_toml(content: &str) -> ToteResult<Self> {
        toml::from_str(content).map_err(|e| ToteError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    /// Load configuration from `path`, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> ToteResult<Self> {
        if !path.is_file() {
            tracing::debug!("no configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ToteError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// `Tote.toml` in the current working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }
}
