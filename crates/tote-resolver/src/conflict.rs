//! Detection of ids that resolved to more than one version.

use std::collections::BTreeMap;
use std::fmt;

use tote_core::{PackageRecord, Version};

/// Every id that appears at several versions in one resolution.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One id present at more than one version, versions ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub id: String,
    pub versions: Vec<Version>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `records` by case-insensitive id and report every id with
    /// more than one distinct version. Conflicts are ordered by id.
    pub fn detect<'a>(records: impl IntoIterator<Item = &'a PackageRecord>) -> Self {
        let mut by_id: BTreeMap<String, VersionConflict> = BTreeMap::new();
        for record in records {
            let entry = by_id
                .entry(record.id.to_lowercase())
                .or_insert_with(|| VersionConflict {
                    id: record.id.clone(),
                    versions: Vec::new(),
                });
            if !entry.versions.contains(&record.version) {
                entry.versions.push(record.version.clone());
            }
        }

        let mut report = Self::new();
        for mut conflict in by_id.into_values() {
            if conflict.versions.len() > 1 {
                conflict.versions.sort();
                report.add(conflict);
            }
        }
        report
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        write!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            write!(f, "\n  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions: Vec<&str> = self.versions.iter().map(Version::as_str).collect();
        write!(f, "{} required at {}", self.id, versions.join(", "))
    }
}
