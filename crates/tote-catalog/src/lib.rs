//! Package catalogs: one query/mutation contract over several backing stores.
//!
//! - [`directory::ArchiveDirectory`]: a local directory of package archives
//!   and unpacked package directories.
//! - [`remote::ServiceCatalog`]: a paginated remote catalog service.
//! - [`feed::FeedCatalog`]: a static XML feed parsed once at construction.
//!
//! All backends answer the read queries of [`Catalog`] identically; only the
//! directory and service backends accept `push` and `yank`.

pub mod archive;
pub mod directory;
pub mod feed;
pub mod query;
pub mod remote;

use std::path::{Path, PathBuf};

use tote_core::config::{CatalogKind, CatalogSpec, ServiceConfig, ToteConfig, UnavailablePolicy};
use tote_core::{Constraint, PackageRecord, VersionOrdering};
use tote_util::errors::ToteResult;

pub use directory::ArchiveDirectory;
pub use feed::FeedCatalog;
pub use remote::{HttpTransport, ServiceCatalog, ServiceResponse, ServiceTransport};

/// A queryable, possibly mutable, collection of package records.
///
/// Read queries are side-effect free. Ids are compared case-insensitively
/// and results that list several versions are ascending by version.
pub trait Catalog: Send + Sync {
    /// Path or URL identifying the backing store.
    fn location(&self) -> &str;

    /// Name shown to users. Defaults to the location.
    fn name(&self) -> &str {
        self.location()
    }

    /// Every record, all versions.
    fn all_records(&self) -> ToteResult<Vec<PackageRecord>>;

    /// Highest version satisfying `constraint`, if any.
    fn get(&self, constraint: &Constraint) -> ToteResult<Option<PackageRecord>> {
        self.get_with(constraint, VersionOrdering::default())
    }

    /// [`Catalog::get`] under an explicit version ordering.
    fn get_with(
        &self,
        constraint: &Constraint,
        ordering: VersionOrdering,
    ) -> ToteResult<Option<PackageRecord>> {
        let candidates = self.records_with_id(constraint.id())?;
        Ok(query::best_match_with(candidates, constraint, ordering))
    }

    /// One record per id: its highest version.
    fn latest_records(&self) -> ToteResult<Vec<PackageRecord>> {
        Ok(query::latest(self.all_records()?))
    }

    /// All versions of `id`, ascending.
    fn records_with_id(&self, id: &str) -> ToteResult<Vec<PackageRecord>> {
        Ok(query::with_id(self.all_records()?, id))
    }

    /// Records satisfying every constraint, ascending by version.
    fn records_matching(&self, constraints: &[Constraint]) -> ToteResult<Vec<PackageRecord>> {
        Ok(query::matching(self.all_records()?, constraints))
    }

    /// Write the best match for `constraint` into `dest`, returning the
    /// written path, or `None` when nothing matches.
    fn fetch(&self, constraint: &Constraint, dest: &Path) -> ToteResult<Option<PathBuf>>;

    /// Publish an archive. Returns `None` if the id and version already exist.
    fn push(&self, archive: &Path) -> ToteResult<Option<PackageRecord>>;

    /// Remove the best match for `constraint`. Returns whether a version was removed.
    fn yank(&self, constraint: &Constraint) -> ToteResult<bool>;
}

/// Open one configured catalog.
pub fn open(spec: &CatalogSpec, service: &ServiceConfig) -> ToteResult<Box<dyn Catalog>> {
    let name = spec.name.clone();
    let catalog: Box<dyn Catalog> = match spec.kind {
        CatalogKind::Directory => {
            let mut catalog = ArchiveDirectory::new(&spec.location);
            if let Some(name) = name {
                catalog = catalog.with_name(name);
            }
            Box::new(catalog)
        }
        CatalogKind::Service => {
            let mut catalog = ServiceCatalog::connect(&spec.location, service)?;
            if let Some(name) = name {
                catalog = catalog.with_name(name);
            }
            Box::new(catalog)
        }
        CatalogKind::Feed => {
            let mut catalog = FeedCatalog::load(Path::new(&spec.location))?;
            if let Some(name) = name {
                catalog = catalog.with_name(name);
            }
            Box::new(catalog)
        }
    };
    tracing::debug!("opened {:?} catalog {}", spec.kind, catalog.name());
    Ok(catalog)
}

/// Open every catalog in `config`, in configured order.
///
/// Under [`UnavailablePolicy::Skip`] a catalog that cannot be opened is
/// logged and left out; otherwise the first failure is returned.
pub fn open_all(config: &ToteConfig) -> ToteResult<Vec<Box<dyn Catalog>>> {
    let mut catalogs = Vec::with_capacity(config.catalogs.len());
    for spec in &config.catalogs {
        match open(spec, &config.service) {
            Ok(catalog) => catalogs.push(catalog),
            Err(e) if e.is_unavailable() && config.resolver.unavailable == UnavailablePolicy::Skip => {
                tracing::warn!("skipping catalog {}: {e}", spec.display_name());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(catalogs)
}
