use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::version::Version;

/// Case-insensitive package id comparison, used everywhere ids are matched.
pub fn ids_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Identity of a package: lower-cased id plus version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageKey {
    pub id: String,
    pub version: Version,
}

impl PackageKey {
    pub fn new(id: &str, version: &Version) -> Self {
        Self {
            id: id.to_lowercase(),
            version: version.clone(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// A package as described by its manifest or a catalog listing.
///
/// `source` names the catalog the record came from. It is for display and
/// fetching only; two records with the same id and version are the same
/// package regardless of where they were found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip)]
    pub source: Option<String>,
}

impl PackageRecord {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            dependencies: Vec::new(),
            description: None,
            authors: Vec::new(),
            source: None,
        }
    }

    /// Builder-style helper to declare a dependency.
    pub fn with_dependency(mut self, dependency: Constraint) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Attach the catalog this record was read from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.id, &self.version)
    }

    /// Canonical archive file name, `<id>-<version>.tpkg`.
    pub fn archive_file_name(&self) -> String {
        format!("{}-{}.{}", self.id, self.version, crate::ARCHIVE_EXTENSION)
    }
}

impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PackageRecord {}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}
