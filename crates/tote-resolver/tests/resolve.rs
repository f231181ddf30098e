use tote_catalog::{ArchiveDirectory, Catalog, FeedCatalog};
use tote_core::config::{DiamondPolicy, ResolverConfig, UnavailablePolicy};
use tote_core::{Constraint, PackageKey, PackageRecord, Version, VersionOrdering};
use tote_resolver::{resolve, ResolveError, ResolveOptions, Resolver};

fn c(s: &str) -> Constraint {
    Constraint::parse(s).unwrap()
}

fn pkg(id: &str, version: &str, deps: &[&str]) -> PackageRecord {
    deps.iter().fold(
        PackageRecord::new(id, Version::parse(version).unwrap()),
        |r, d| r.with_dependency(c(d)),
    )
}

fn feed(name: &str, records: Vec<PackageRecord>) -> Box<dyn Catalog> {
    Box::new(FeedCatalog::from_records(name, records))
}

fn ids(resolution: &tote_resolver::Resolution) -> Vec<String> {
    resolution.packages.iter().map(|p| p.record.to_string()).collect()
}

fn tree_catalog() -> Vec<Box<dyn Catalog>> {
    vec![feed(
        "main",
        vec![
            pkg("P1Sub", "1.0", &["P1SubSub1", "P1SubSub2"]),
            pkg("P1SubSub1", "1.0", &[]),
            pkg("P1SubSub2", "1.0", &["P1SubSubSub"]),
            pkg("P1SubSubSub", "1.0", &[]),
        ],
    )]
}

#[test]
fn test_basic_transitive_closure() {
    let catalogs = tree_catalog();
    let root = pkg("P1", "1.0", &["P1Sub"]);
    let resolution = resolve(&[root], &catalogs).unwrap();
    assert_eq!(
        ids(&resolution),
        vec!["P1Sub 1.0", "P1SubSub1 1.0", "P1SubSub2 1.0", "P1SubSubSub 1.0"]
    );
    assert!(resolution.packages.iter().all(|p| p.source == "main"));
    assert!(resolution.conflicts.is_empty());
    assert!(resolution.skipped.is_empty());
}

#[test]
fn test_one_missing_dependency_fails_whole_resolution() {
    let catalogs = vec![feed(
        "main",
        vec![
            pkg("P1Sub", "1.0", &["P1SubSub1", "P1SubSub2"]),
            pkg("P1SubSub1", "1.0", &[]),
            pkg("P1SubSub2", "1.0", &["P1SubSubSub = 2.0"]),
            pkg("P1SubSubSub", "1.0", &[]),
        ],
    )];
    let root = pkg("P1", "1.0", &["P1Sub"]);
    let err = resolve(&[root], &catalogs).unwrap_err();
    assert_eq!(err.missing(), &[c("P1SubSubSub = 2.0")]);
    assert!(err.to_string().contains("Unable to resolve 1 dependency"));
}

#[test]
fn test_missing_list_is_aggregated_and_deduplicated() {
    let catalogs = vec![feed(
        "main",
        vec![
            pkg("A", "1.0", &["Gone >= 1.0"]),
            pkg("B", "1.0", &["Gone >= 1.0", "Absent"]),
        ],
    )];
    let root = pkg("App", "1.0", &["A", "B", "Nowhere 3.0"]);
    match resolve(&[root], &catalogs) {
        Err(ResolveError::MissingDependencies(missing)) => {
            assert_eq!(missing, vec![c("Nowhere = 3.0"), c("Gone >= 1.0"), c("Absent")]);
        }
        other => panic!("expected missing dependencies, got {other:?}"),
    }
}

#[test]
fn test_cycles_terminate() {
    let catalogs = vec![feed(
        "main",
        vec![pkg("A", "1.0", &["B"]), pkg("B", "1.0", &["A"])],
    )];
    let root = pkg("App", "1.0", &["A"]);
    let resolution = resolve(&[root], &catalogs).unwrap();
    assert_eq!(ids(&resolution), vec!["A 1.0", "B 1.0"]);
}

#[test]
fn test_roots_are_excluded_even_when_required() {
    let catalogs = vec![feed(
        "main",
        vec![pkg("App", "1.0", &[]), pkg("Lib", "1.0", &["app"])],
    )];
    let root = pkg("App", "1.0", &["Lib"]);
    let resolution = resolve(&[root], &catalogs).unwrap();
    assert_eq!(ids(&resolution), vec!["Lib 1.0"]);
}

#[test]
fn test_first_catalog_wins() {
    let catalogs = vec![
        feed("first", vec![pkg("Foo", "1.0", &[])]),
        feed("second", vec![pkg("Foo", "2.0", &[]), pkg("Bar", "1.0", &[])]),
    ];
    let root = pkg("App", "1.0", &["Foo", "Bar"]);
    let resolution = resolve(&[root], &catalogs).unwrap();
    let foo = &resolution.packages[1];
    assert_eq!(foo.record.to_string(), "Foo 1.0");
    assert_eq!(foo.source, "first");
    assert_eq!(resolution.packages[0].source, "second");
}

#[test]
fn test_multiple_roots() {
    let catalogs = tree_catalog();
    let roots = [pkg("R1", "1.0", &["P1SubSub1"]), pkg("R2", "1.0", &["P1SubSub1", "P1SubSub2"])];
    let resolution = resolve(&roots, &catalogs).unwrap();
    assert_eq!(resolution.len(), 3);
    let key = PackageKey::new("p1subsubsub", &Version::parse("1.0").unwrap());
    assert!(resolution.contains(&key));
}

fn diamond() -> (Vec<Box<dyn Catalog>>, PackageRecord) {
    let catalogs = vec![feed(
        "main",
        vec![
            pkg("A", "1.0", &["Log = 1.0"]),
            pkg("B", "1.0", &["Log = 2.0"]),
            pkg("Log", "1.0", &[]),
            pkg("Log", "2.0", &[]),
        ],
    )];
    (catalogs, pkg("App", "1.0", &["A", "B"]))
}

#[test]
fn test_diamond_allowed_by_default() {
    let (catalogs, root) = diamond();
    let resolution = resolve(&[root], &catalogs).unwrap();
    assert_eq!(ids(&resolution), vec!["A 1.0", "B 1.0", "Log 1.0", "Log 2.0"]);
    assert_eq!(resolution.conflicts.len(), 1);
    assert_eq!(resolution.conflicts.conflicts[0].id, "Log");
}

#[test]
fn test_diamond_rejected_when_configured() {
    let (catalogs, root) = diamond();
    let options = ResolveOptions {
        diamond: DiamondPolicy::Reject,
        ..Default::default()
    };
    let err = Resolver::new(&catalogs, options).resolve(&[root]).unwrap_err();
    match err {
        ResolveError::Conflicts(report) => {
            assert_eq!(report.len(), 1);
            assert_eq!(report.conflicts[0].versions.len(), 2);
        }
        other => panic!("expected conflicts, got {other:?}"),
    }
}

fn with_unreachable_first() -> (tempfile::TempDir, Vec<Box<dyn Catalog>>) {
    let tmp = tempfile::tempdir().unwrap();
    let catalogs: Vec<Box<dyn Catalog>> = vec![
        Box::new(ArchiveDirectory::new(tmp.path().join("gone")).with_name("offline")),
        feed("backup", vec![pkg("Foo", "1.0", &[]), pkg("Bar", "1.0", &[])]),
    ];
    (tmp, catalogs)
}

#[test]
fn test_unavailable_catalog_aborts_by_default() {
    let (_tmp, catalogs) = with_unreachable_first();
    let err = resolve(&[pkg("App", "1.0", &["Foo"])], &catalogs).unwrap_err();
    match err {
        ResolveError::Catalog(e) => assert!(e.is_unavailable()),
        other => panic!("expected catalog error, got {other:?}"),
    }
}

#[test]
fn test_unavailable_catalog_skipped_when_configured() {
    let (_tmp, catalogs) = with_unreachable_first();
    let config = ResolverConfig {
        unavailable: UnavailablePolicy::Skip,
        ..Default::default()
    };
    let resolver = Resolver::new(&catalogs, ResolveOptions::from(&config));
    let resolution = resolver.resolve(&[pkg("App", "1.0", &["Foo", "Bar"])]).unwrap();
    assert_eq!(resolution.len(), 2);
    assert_eq!(resolution.skipped, vec!["offline"]);
}

#[test]
fn test_version_ordering_option() {
    let catalogs = vec![feed("main", vec![pkg("Foo", "1.0.0", &[])])];
    let root = [pkg("App", "1.0", &["Foo > 1.0"])];

    assert_eq!(resolve(&root, &catalogs).unwrap().len(), 1);

    let options = ResolveOptions {
        ordering: VersionOrdering::ZeroPadded,
        ..Default::default()
    };
    let err = Resolver::new(&catalogs, options).resolve(&root).unwrap_err();
    assert_eq!(err.missing().len(), 1);
}

#[test]
fn test_graph_records_edges() {
    let catalogs = tree_catalog();
    let resolution = resolve(&[pkg("P1", "1.0", &["P1Sub"])], &catalogs).unwrap();
    let tree = resolution.graph.print_tree(None);
    assert!(tree.starts_with("P1 1.0\n└── P1Sub 1.0\n"));
    let path: Vec<String> = resolution
        .graph
        .find_path("P1SubSubSub")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(path, vec!["P1 1.0", "P1Sub 1.0", "P1SubSub2 1.0", "P1SubSubSub 1.0"]);
}

#[test]
fn test_no_dependencies_resolves_empty() {
    let catalogs: Vec<Box<dyn Catalog>> = Vec::new();
    let resolution = resolve(&[pkg("Lonely", "1.0", &[])], &catalogs).unwrap();
    assert!(resolution.is_empty());
}
