//! Core data types for the tote package manager.
//!
//! This crate defines the value types every other crate shares: dotted
//! numeric versions and their ordering, package constraints, package records,
//! the XML package manifest, and configuration.
//!
//! This crate performs no network I/O.

/// File extension of package archives.
pub const ARCHIVE_EXTENSION: &str = "tpkg";

pub mod config;
pub mod constraint;
pub mod manifest;
pub mod package;
pub mod version;

pub use constraint::{Constraint, Operator, Requirement};
pub use package::{PackageKey, PackageRecord};
pub use version::{Version, VersionOrdering};
