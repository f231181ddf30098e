//! Dependency resolution: expands root packages into the transitive set of
//! packages they require, looked up across an ordered list of catalogs.

pub mod conflict;
pub mod graph;
pub mod resolved;
pub mod resolver;

pub use conflict::{ConflictReport, VersionConflict};
pub use graph::ResolutionGraph;
pub use resolver::{resolve, Resolution, ResolveError, ResolveOptions, ResolvedPackage, Resolver};
