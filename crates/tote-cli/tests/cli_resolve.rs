use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn tote_cmd() -> Command {
    Command::cargo_bin("tote").unwrap()
}

const FEED: &str = r#"<feed>
  <entry><id>P1Sub</id><version>1.0</version>
    <dependency>P1SubSub1</dependency>
    <dependency>P1SubSub2 >= 1.0</dependency>
  </entry>
  <entry><id>P1SubSub1</id><version>1.0</version></entry>
  <entry><id>P1SubSub2</id><version>1.0</version><dependency>P1SubSubSub</dependency></entry>
  <entry><id>P1SubSubSub</id><version>1.0</version></entry>
</feed>"#;

fn project(root_deps: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("feed.xml"), FEED).unwrap();
    fs::write(
        tmp.path().join("package.xml"),
        format!(
            "<package><metadata><id>P1</id><version>1.0</version>\
             <dependencies>{root_deps}</dependencies></metadata></package>"
        ),
    )
    .unwrap();
    fs::write(
        tmp.path().join("Tote.toml"),
        "[[catalog]]\nkind = \"feed\"\nlocation = \"feed.xml\"\nname = \"main\"\n",
    )
    .unwrap();
    tmp
}

#[test]
fn test_resolve_lists_transitive_closure() {
    let tmp = project(r#"<dependency id="P1Sub" />"#);
    tote_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "package.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1Sub 1.0 (main)"))
        .stdout(predicate::str::contains("P1SubSubSub 1.0 (main)"))
        .stdout(predicate::str::contains("P1 1.0 (").not())
        .stderr(predicate::str::contains("Resolved 4 packages"));
}

#[test]
fn test_resolve_tree_and_why() {
    let tmp = project(r#"<dependency id="P1Sub" />"#);
    tote_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "package.xml", "--tree", "--why", "p1subsubsub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1 1.0\n└── P1Sub 1.0"))
        .stdout(predicate::str::contains(
            "P1 1.0 -> P1Sub 1.0 -> P1SubSub2 1.0 -> P1SubSubSub 1.0",
        ));
}

#[test]
fn test_resolve_reports_every_missing_dependency() {
    let tmp = project(r#"<dependency id="P1Sub" /><dependency id="Ghost" version="2.0" /><dependency id="Phantom" />"#);
    tote_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "package.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to resolve 2 dependencies"))
        .stderr(predicate::str::contains("Ghost = 2.0"))
        .stderr(predicate::str::contains("Phantom"));
}

#[test]
fn test_resolve_without_catalogs_fails() {
    let tmp = project("");
    fs::remove_file(tmp.path().join("Tote.toml")).unwrap();
    tote_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "package.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No catalogs configured"));
}

#[test]
fn test_search_matches_constraint() {
    let tmp = project("");
    tote_cmd()
        .current_dir(tmp.path())
        .args(["search", "p1subsub2 >= 1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1SubSub2 1.0 (main)"));
}

#[test]
fn test_invalid_constraint_is_reported() {
    let tmp = project("");
    tote_cmd()
        .current_dir(tmp.path())
        .args(["search", "Foo>=1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid constraint"));
}

#[test]
fn test_feed_is_read_only() {
    let tmp = project("");
    tote_cmd()
        .current_dir(tmp.path())
        .args(["yank", "P1Sub"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
}

#[test]
fn test_unavailable_catalog_skipped_by_config() {
    let tmp = project(r#"<dependency id="P1SubSub1" />"#);
    fs::write(
        tmp.path().join("Tote.toml"),
        "[[catalog]]\nkind = \"directory\"\nlocation = \"missing-dir\"\n\n\
         [[catalog]]\nkind = \"feed\"\nlocation = \"feed.xml\"\nname = \"main\"\n\n\
         [resolver]\nunavailable = \"skip\"\n",
    )
    .unwrap();
    tote_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "package.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1SubSub1 1.0 (main)"))
        .stderr(predicate::str::contains("missing-dir"));
}
