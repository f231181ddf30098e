//! Catalog backed by a local directory.
//!
//! Each package version is either an archive file (`Foo-1.0.tpkg`) or an
//! unpacked subdirectory holding a `package.xml`. Manifests are read on
//! every query; nothing is cached.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tote_core::manifest::{self, MANIFEST_FILE_NAME};
use tote_core::{Constraint, PackageRecord, VersionOrdering};
use tote_util::errors::{ToteError, ToteResult};
use tote_util::lock::DirLock;

use crate::{archive, query, Catalog};

/// A package version found on disk.
#[derive(Debug, Clone)]
struct DirectoryEntry {
    record: PackageRecord,
    path: PathBuf,
}

/// Catalog over a directory of archives and unpacked packages.
///
/// `push` and `yank` serialize through an in-process mutex and an advisory
/// lock file in the directory, so one writer at a time mutates it.
#[derive(Debug)]
pub struct ArchiveDirectory {
    root: PathBuf,
    location: String,
    name: Option<String>,
    writer: Mutex<()>,
}

impl ArchiveDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            location: root.display().to_string(),
            root,
            name: None,
            writer: Mutex::new(()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> ToteResult<Vec<DirectoryEntry>> {
        let dir = std::fs::read_dir(&self.root).map_err(|e| ToteError::CatalogUnavailable {
            catalog: self.name().to_string(),
            message: format!("cannot read {}: {e}", self.root.display()),
        })?;

        let mut entries = Vec::new();
        for item in dir {
            let path = item?.path();
            let parsed = if path.is_file() && archive::is_archive(&path) {
                archive::read_record(&path)
            } else if path.join(MANIFEST_FILE_NAME).is_file() {
                manifest::read_manifest(&path.join(MANIFEST_FILE_NAME))
            } else {
                continue;
            };
            match parsed {
                Ok(record) => entries.push(DirectoryEntry {
                    record: record.with_source(self.name()),
                    path,
                }),
                Err(e) => tracing::warn!("ignoring {}: {e}", path.display()),
            }
        }
        Ok(entries)
    }

    fn best_entry(
        &self,
        constraint: &Constraint,
        ordering: VersionOrdering,
    ) -> ToteResult<Option<DirectoryEntry>> {
        let mut entries = self.entries()?;
        let Some(best) = query::best_match_with(
            entries.iter().map(|e| e.record.clone()),
            constraint,
            ordering,
        ) else {
            return Ok(None);
        };
        let index = entries.iter().position(|e| e.record == best);
        Ok(index.map(|i| entries.swap_remove(i)))
    }
}

impl Catalog for ArchiveDirectory {
    fn location(&self) -> &str {
        &self.location
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }

    fn all_records(&self) -> ToteResult<Vec<PackageRecord>> {
        let mut records: Vec<PackageRecord> = self.entries()?.into_iter().map(|e| e.record).collect();
        query::sort_ascending(&mut records);
        Ok(records)
    }

    fn fetch(&self, constraint: &Constraint, dest: &Path) -> ToteResult<Option<PathBuf>> {
        let Some(entry) = self.best_entry(constraint, VersionOrdering::default())? else {
            return Ok(None);
        };
        let written = if entry.path.is_dir() {
            let target = dest.join(format!("{}-{}", entry.record.id, entry.record.version));
            tote_util::fs::copy_dir_all(&entry.path, &target)?;
            target
        } else {
            tote_util::fs::copy_into(&entry.path, dest)?
        };
        tracing::debug!("fetched {} to {}", entry.record, written.display());
        Ok(Some(written))
    }

    fn push(&self, archive_path: &Path) -> ToteResult<Option<PackageRecord>> {
        let record = archive::read_record(archive_path)?;
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        tote_util::fs::ensure_dir(&self.root)?;
        let _lock = DirLock::acquire(&self.root)?;

        if self.entries()?.iter().any(|e| e.record == record) {
            tracing::info!("{record} already exists in {}", self.name());
            return Ok(None);
        }

        let target = self.root.join(record.archive_file_name());
        std::fs::copy(archive_path, &target)?;
        let digest = tote_util::hash::sha256_file(&target)?;
        tracing::info!(sha256 = %digest, "pushed {record} to {}", self.name());
        Ok(Some(record.with_source(self.name())))
    }

    fn yank(&self, constraint: &Constraint) -> ToteResult<bool> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.root.is_dir() {
            return Ok(false);
        }
        let _lock = DirLock::acquire(&self.root)?;

        let Some(entry) = self.best_entry(constraint, VersionOrdering::default())? else {
            return Ok(false);
        };
        if entry.path.is_dir() {
            std::fs::remove_dir_all(&entry.path)?;
        } else {
            std::fs::remove_file(&entry.path)?;
        }
        tracing::info!("yanked {} from {}", entry.record, self.name());
        Ok(true)
    }
}
