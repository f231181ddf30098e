use std::path::PathBuf;

use tote_util::errors::ToteError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = ToteError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_invalid_version_display() {
    let err = ToteError::InvalidVersion {
        input: "1.x".to_string(),
        reason: "segment 'x' is not a non-negative integer".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid version '1.x': segment 'x' is not a non-negative integer"
    );
}

#[test]
fn test_invalid_constraint_display() {
    let err = ToteError::InvalidConstraint {
        input: "".to_string(),
        reason: "missing package id".to_string(),
    };
    assert_eq!(err.to_string(), "Invalid constraint '': missing package id");
}

#[test]
fn test_unavailable_is_classified() {
    let err = ToteError::CatalogUnavailable {
        catalog: "https://pkgs.example.com".to_string(),
        message: "timed out".to_string(),
    };
    assert!(err.is_unavailable());
    assert_eq!(
        err.to_string(),
        "Catalog 'https://pkgs.example.com' is unavailable: timed out"
    );
}

#[test]
fn test_other_errors_are_not_unavailable() {
    let err = ToteError::Generic {
        message: "something broke".to_string(),
    };
    assert!(!err.is_unavailable());
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_read_only_display() {
    let err = ToteError::ReadOnlyCatalog {
        catalog: "feed.xml".to_string(),
        operation: "push".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Catalog 'feed.xml' is read-only and does not support push"
    );
}

#[test]
fn test_locked_display_names_path() {
    let err = ToteError::CatalogLocked {
        path: PathBuf::from("/srv/pkgs/.tote.lock"),
    };
    assert!(err.to_string().contains("/srv/pkgs/.tote.lock"));
}
