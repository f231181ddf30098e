use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all tote operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ToteError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text could not be parsed as a dotted numeric version.
    #[error("Invalid version '{input}': {reason}")]
    #[diagnostic(help("Versions are dot-separated non-negative integers, e.g. 2.0.10"))]
    InvalidVersion { input: String, reason: String },

    /// Text could not be parsed as a package constraint.
    #[error("Invalid constraint '{input}': {reason}")]
    #[diagnostic(help("Constraints look like `Foo`, `Foo 1.0`, or `Foo >= 1.0 < 2.0`"))]
    InvalidConstraint { input: String, reason: String },

    /// Invalid or malformed package manifest.
    #[error("Manifest error: {message}")]
    Manifest { message: String },

    /// A package archive could not be read or written.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Invalid configuration (e.g. Tote.toml).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your Tote.toml for syntax errors"))]
    Config { message: String },

    /// A catalog backend could not be reached or answered with a server failure.
    #[error("Catalog '{catalog}' is unavailable: {message}")]
    CatalogUnavailable { catalog: String, message: String },

    /// A mutation was attempted on a catalog that only supports reads.
    #[error("Catalog '{catalog}' is read-only and does not support {operation}")]
    ReadOnlyCatalog { catalog: String, operation: String },

    /// Another writer holds the catalog's advisory lock.
    #[error("Catalog is locked by another writer: {}", path.display())]
    #[diagnostic(help("Wait for the other operation to finish, or remove a stale lock file"))]
    CatalogLocked { path: PathBuf },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl ToteError {
    /// Whether this error means a catalog could not be consulted at all,
    /// as opposed to a failure inside a reachable catalog.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ToteError::CatalogUnavailable { .. })
    }
}

/// Convenience alias for results carrying a [`ToteError`].
pub type ToteResult<T> = Result<T, ToteError>;
