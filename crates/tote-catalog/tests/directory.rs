use std::fs;
use std::path::{Path, PathBuf};

use tote_catalog::{archive, ArchiveDirectory, Catalog};
use tote_core::manifest::render_manifest;
use tote_core::{Constraint, PackageRecord, Version};
use tote_util::errors::ToteError;
use tote_util::lock::DirLock;

fn c(s: &str) -> Constraint {
    Constraint::parse(s).unwrap()
}

fn record(id: &str, version: &str, deps: &[&str]) -> PackageRecord {
    deps.iter().fold(
        PackageRecord::new(id, Version::parse(version).unwrap()),
        |r, d| r.with_dependency(c(d)),
    )
}

/// Pack `record` into `out_dir` via a scratch manifest.
fn make_archive(scratch: &Path, out_dir: &Path, record: &PackageRecord) -> PathBuf {
    let manifest = scratch.join(format!("{}-{}.xml", record.id, record.version));
    fs::write(&manifest, render_manifest(record)).unwrap();
    archive::pack(&manifest, &[], out_dir).unwrap()
}

fn seeded() -> (tempfile::TempDir, ArchiveDirectory) {
    let tmp = tempfile::tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let repo = tmp.path().join("repo");
    fs::create_dir_all(&scratch).unwrap();
    for r in [
        record("NUnit", "2.4.8", &[]),
        record("NUnit", "2.5", &[]),
        record("NUnit", "2.5.1", &[]),
        record("Moq", "4.0", &["Castle.Core >= 2.5"]),
    ] {
        make_archive(&scratch, &repo, &r);
    }
    let unpacked = repo.join("Castle.Core-2.5.2");
    fs::create_dir_all(&unpacked).unwrap();
    fs::write(
        unpacked.join("package.xml"),
        render_manifest(&record("Castle.Core", "2.5.2", &[])),
    )
    .unwrap();
    fs::write(unpacked.join("Castle.Core.dll"), "binary").unwrap();
    let catalog = ArchiveDirectory::new(&repo).with_name("local");
    (tmp, catalog)
}

#[test]
fn test_all_records_includes_archives_and_unpacked_dirs() {
    let (_tmp, catalog) = seeded();
    let records = catalog.all_records().unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.source.as_deref() == Some("local")));
    assert!(records.iter().any(|r| r.id == "Castle.Core"));
}

#[test]
fn test_get_picks_highest_satisfying() {
    let (_tmp, catalog) = seeded();
    let best = catalog.get(&c("nunit < 2.5.1")).unwrap().unwrap();
    assert_eq!(best.to_string(), "NUnit 2.5");
    assert!(catalog.get(&c("NUnit > 3")).unwrap().is_none());
}

#[test]
fn test_records_with_id_ascending() {
    let (_tmp, catalog) = seeded();
    let versions: Vec<String> = catalog
        .records_with_id("nunit")
        .unwrap()
        .iter()
        .map(|r| r.version.to_string())
        .collect();
    assert_eq!(versions, vec!["2.4.8", "2.5", "2.5.1"]);
}

#[test]
fn test_latest_records() {
    let (_tmp, catalog) = seeded();
    let latest: Vec<String> = catalog
        .latest_records()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(latest, vec!["Castle.Core 2.5.2", "Moq 4.0", "NUnit 2.5.1"]);
}

#[test]
fn test_records_matching_multiple_constraints() {
    let (_tmp, catalog) = seeded();
    let found = catalog
        .records_matching(&[c("NUnit >= 2.5"), c("NUnit ~> 2.5")])
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn test_fetch_copies_archive() {
    let (tmp, catalog) = seeded();
    let dest = tmp.path().join("dest");
    let fetched = catalog.fetch(&c("Moq"), &dest).unwrap().unwrap();
    assert_eq!(fetched, dest.join("Moq-4.0.tpkg"));
    assert_eq!(archive::read_record(&fetched).unwrap().id, "Moq");
    assert!(catalog.fetch(&c("Missing"), &dest).unwrap().is_none());
}

#[test]
fn test_fetch_copies_unpacked_directory() {
    let (tmp, catalog) = seeded();
    let dest = tmp.path().join("dest");
    let fetched = catalog.fetch(&c("castle.core"), &dest).unwrap().unwrap();
    assert!(fetched.join("Castle.Core.dll").is_file());
    assert!(fetched.join("package.xml").is_file());
}

#[test]
fn test_push_rejects_duplicates() {
    let (tmp, catalog) = seeded();
    let scratch = tmp.path().join("scratch");
    let incoming = tmp.path().join("incoming");

    let fresh = make_archive(&scratch, &incoming, &record("Fresh", "1.0", &["NUnit"]));
    let pushed = catalog.push(&fresh).unwrap().unwrap();
    assert_eq!(pushed.to_string(), "Fresh 1.0");
    assert!(catalog.get(&c("fresh = 1.0")).unwrap().is_some());

    let duplicate = make_archive(&scratch, &incoming, &record("nunit", "2.5", &[]));
    assert!(catalog.push(&duplicate).unwrap().is_none());
}

#[test]
fn test_push_creates_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = make_archive(tmp.path(), tmp.path(), &record("A", "1", &[]));
    let catalog = ArchiveDirectory::new(tmp.path().join("new-repo"));
    assert!(catalog.push(&archive).unwrap().is_some());
    assert_eq!(catalog.all_records().unwrap().len(), 1);
}

#[test]
fn test_yank_removes_best_match_once() {
    let (_tmp, catalog) = seeded();
    assert!(catalog.yank(&c("NUnit = 2.5")).unwrap());
    assert!(!catalog.yank(&c("NUnit = 2.5")).unwrap());
    assert_eq!(catalog.records_with_id("NUnit").unwrap().len(), 2);

    assert!(catalog.yank(&c("Castle.Core")).unwrap());
    assert!(catalog.get(&c("Castle.Core")).unwrap().is_none());
}

#[test]
fn test_mutation_fails_while_locked() {
    let (tmp, catalog) = seeded();
    let held = DirLock::acquire(catalog.root()).unwrap();
    let result = catalog.yank(&c("NUnit"));
    assert!(matches!(result, Err(ToteError::CatalogLocked { .. })));
    drop(held);
    assert!(catalog.yank(&c("NUnit")).unwrap());
    assert!(!tmp.path().join("repo").join(".tote.lock").exists());
}

#[test]
fn test_missing_directory_is_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = ArchiveDirectory::new(tmp.path().join("nope"));
    let err = catalog.all_records().unwrap_err();
    assert!(err.is_unavailable());
}

#[test]
fn test_corrupt_archive_is_ignored() {
    let (_tmp, catalog) = seeded();
    fs::write(catalog.root().join("Broken-1.0.tpkg"), "garbage").unwrap();
    assert_eq!(catalog.all_records().unwrap().len(), 5);
}
