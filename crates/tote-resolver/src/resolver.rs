//! Transitive closure over an ordered list of catalogs.
//!
//! Resolution is a single breadth-first pass:
//!
//! 1. Every dependency of every root goes onto the frontier.
//! 2. Each constraint popped from the frontier is looked up in the catalogs
//!    in order; the first catalog with a match wins.
//! 3. A match not seen before (and not a root) joins the result and its own
//!    dependencies go onto the frontier. A match seen before is dropped,
//!    which is what terminates cycles.
//! 4. A constraint no catalog satisfies is recorded and the pass continues,
//!    so one failed resolution reports every unmet constraint at once.

use std::collections::{HashMap, HashSet, VecDeque};

use miette::Diagnostic;
use petgraph::graph::NodeIndex;
use thiserror::Error;
use tote_catalog::Catalog;
use tote_core::config::{DiamondPolicy, ResolverConfig, UnavailablePolicy};
use tote_core::{Constraint, PackageKey, PackageRecord, VersionOrdering};
use tote_util::errors::ToteError;

use crate::conflict::ConflictReport;
use crate::graph::ResolutionGraph;
use crate::resolved::ResolvedSet;

/// Policies applied during one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub diamond: DiamondPolicy,
    pub unavailable: UnavailablePolicy,
    pub ordering: VersionOrdering,
}

impl From<&ResolverConfig> for ResolveOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            diamond: config.diamond,
            unavailable: config.unavailable,
            ordering: config.version_ordering,
        }
    }
}

/// A resolved package and the catalog it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub record: PackageRecord,
    pub source: String,
}

/// The output of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Every required package, roots excluded, sorted by id then version.
    pub packages: Vec<ResolvedPackage>,
    pub graph: ResolutionGraph,
    /// Ids present at more than one version. Empty unless diamonds are allowed.
    pub conflicts: ConflictReport,
    /// Catalogs left out because they were unavailable.
    pub skipped: Vec<String>,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether a package with this id and version was resolved.
    pub fn contains(&self, key: &PackageKey) -> bool {
        self.packages.iter().any(|p| &p.record.key() == key)
    }
}

/// Why a resolution failed.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// Constraints no catalog could satisfy, in the order they were found.
    #[error("{}", missing_message(.0))]
    #[diagnostic(help("Add a catalog that provides these packages, or relax the constraints"))]
    MissingDependencies(Vec<Constraint>),

    /// Several versions of one id were required and diamonds are rejected.
    #[error("{0}")]
    #[diagnostic(help("Align the constraints on a single version, or set `diamond = \"allow\"` under [resolver]"))]
    Conflicts(ConflictReport),

    /// A catalog failed in a way resolution cannot recover from.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] ToteError),
}

impl ResolveError {
    /// The unmet constraints, if this is a missing-dependency failure.
    pub fn missing(&self) -> &[Constraint] {
        match self {
            ResolveError::MissingDependencies(missing) => missing,
            _ => &[],
        }
    }
}

fn missing_message(constraints: &[Constraint]) -> String {
    let noun = if constraints.len() == 1 { "dependency" } else { "dependencies" };
    let mut message = format!("Unable to resolve {} {noun}:", constraints.len());
    for c in constraints {
        message.push_str(&format!("\n  - {c}"));
    }
    message
}

/// A constraint waiting on the frontier, with the node that required it.
struct FrontierEntry {
    constraint: Constraint,
    parent: NodeIndex,
}

/// Resolves roots against an ordered list of catalogs.
pub struct Resolver<'a> {
    catalogs: &'a [Box<dyn Catalog>],
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(catalogs: &'a [Box<dyn Catalog>], options: ResolveOptions) -> Self {
        Self { catalogs, options }
    }

    /// Expand `roots` into the packages they transitively require.
    pub fn resolve(&self, roots: &[PackageRecord]) -> Result<Resolution, ResolveError> {
        let mut graph = ResolutionGraph::new();
        let mut resolved = ResolvedSet::new();
        let mut frontier: VecDeque<FrontierEntry> = VecDeque::new();
        let root_keys: HashSet<PackageKey> = roots.iter().map(PackageRecord::key).collect();

        for root in roots {
            let parent = graph.add_root(root);
            frontier.extend(root.dependencies.iter().map(|c| FrontierEntry {
                constraint: c.clone(),
                parent,
            }));
        }

        let mut packages: Vec<ResolvedPackage> = Vec::new();
        let mut missing: Vec<Constraint> = Vec::new();
        let mut lookups: HashMap<Constraint, Option<ResolvedPackage>> = HashMap::new();
        let mut skipped: Vec<usize> = Vec::new();

        while let Some(entry) = frontier.pop_front() {
            let found = match lookups.get(&entry.constraint) {
                Some(found) => found.clone(),
                None => {
                    let found = self.lookup(&entry.constraint, &mut skipped)?;
                    lookups.insert(entry.constraint.clone(), found.clone());
                    found
                }
            };

            let Some(found) = found else {
                if !missing.contains(&entry.constraint) {
                    tracing::debug!("no catalog satisfies {}", entry.constraint);
                    missing.push(entry.constraint);
                }
                continue;
            };

            let node = graph.add_package(&found.record);
            graph.add_edge(entry.parent, node);

            let key = found.record.key();
            if root_keys.contains(&key) || !resolved.insert(key) {
                continue;
            }
            tracing::debug!("{} -> {} from {}", entry.constraint, found.record, found.source);
            frontier.extend(found.record.dependencies.iter().map(|c| FrontierEntry {
                constraint: c.clone(),
                parent: node,
            }));
            packages.push(found);
        }

        if !missing.is_empty() {
            return Err(ResolveError::MissingDependencies(missing));
        }

        packages.sort_by(|a, b| {
            a.record
                .id
                .to_lowercase()
                .cmp(&b.record.id.to_lowercase())
                .then_with(|| a.record.version.cmp(&b.record.version))
        });

        let conflicts =
            ConflictReport::detect(roots.iter().chain(packages.iter().map(|p| &p.record)));
        if !conflicts.is_empty() {
            match self.options.diamond {
                DiamondPolicy::Reject => return Err(ResolveError::Conflicts(conflicts)),
                DiamondPolicy::Allow => {
                    for conflict in &conflicts.conflicts {
                        tracing::warn!("keeping several versions: {conflict}");
                    }
                }
            }
        }

        Ok(Resolution {
            packages,
            graph,
            conflicts,
            skipped: skipped
                .into_iter()
                .map(|i| self.catalogs[i].name().to_string())
                .collect(),
        })
    }

    /// First catalog, in order, with a match for `constraint`.
    fn lookup(
        &self,
        constraint: &Constraint,
        skipped: &mut Vec<usize>,
    ) -> Result<Option<ResolvedPackage>, ResolveError> {
        for (i, catalog) in self.catalogs.iter().enumerate() {
            if skipped.contains(&i) {
                continue;
            }
            match catalog.get_with(constraint, self.options.ordering) {
                Ok(Some(record)) => {
                    return Ok(Some(ResolvedPackage {
                        record,
                        source: catalog.name().to_string(),
                    }));
                }
                Ok(None) => {}
                Err(e) if e.is_unavailable() && self.options.unavailable == UnavailablePolicy::Skip => {
                    tracing::warn!("skipping catalog {}: {e}", catalog.name());
                    skipped.push(i);
                }
                Err(e) => return Err(ResolveError::Catalog(e)),
            }
        }
        Ok(None)
    }
}

/// Resolve `roots` against `catalogs` with default options.
pub fn resolve(
    roots: &[PackageRecord],
    catalogs: &[Box<dyn Catalog>],
) -> Result<Resolution, ResolveError> {
    Resolver::new(catalogs, ResolveOptions::default()).resolve(roots)
}
