use tote_core::manifest::{read_manifest, render_manifest, MANIFEST_FILE_NAME};
use tote_core::{Constraint, PackageRecord, Version};

#[test]
fn test_read_manifest_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(MANIFEST_FILE_NAME);
    std::fs::write(
        &path,
        r#"<package><metadata>
            <id>P1</id><version>1.0</version>
            <dependencies><dependency id="P1Sub" version="~> 1.0" /></dependencies>
        </metadata></package>"#,
    )
    .unwrap();

    let record = read_manifest(&path).unwrap();
    assert_eq!(record.id, "P1");
    assert_eq!(record.dependencies, vec![Constraint::parse("P1Sub ~> 1.0").unwrap()]);
}

#[test]
fn test_read_missing_manifest_fails() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(read_manifest(&tmp.path().join("nope.xml")).is_err());
}

#[test]
fn test_render_escapes_markup() {
    let mut record = PackageRecord::new("A&B", Version::parse("1.0").unwrap());
    record.description = Some("<fast> & small".to_string());
    let xml = render_manifest(&record);
    assert!(xml.contains("<id>A&amp;B</id>"));
    assert!(xml.contains("&lt;fast&gt; &amp; small"));
}
