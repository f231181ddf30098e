//! Package manifest reading and writing.
//!
//! A manifest is a small XML document stored as `package.xml` at the root of
//! every package archive:
//!
//! ```xml
//! <package>
//!   <metadata>
//!     <id>Foo</id>
//!     <version>1.2.0</version>
//!     <description>Does foo things</description>
//!     <authors>Ann, Bob</authors>
//!     <dependencies>
//!       <dependency id="Bar" version="&gt;= 1.0 &lt; 2.0" />
//!       <dependency id="Baz" />
//!     </dependencies>
//!   </metadata>
//! </package>
//! ```

use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tote_util::errors::{ToteError, ToteResult};

use crate::constraint::Constraint;
use crate::package::PackageRecord;
use crate::version::Version;

/// File name of the manifest inside an archive or unpacked package directory.
pub const MANIFEST_FILE_NAME: &str = "package.xml";

fn manifest_error(message: impl Into<String>) -> ToteError {
    ToteError::Manifest {
        message: message.into(),
    }
}

/// Read and parse a manifest file from disk.
pub fn read_manifest(path: &Path) -> ToteResult<PackageRecord> {
    let xml = std::fs::read_to_string(path)
        .map_err(|e| manifest_error(format!("Failed to read {}: {e}", path.display())))?;
    parse_manifest(&xml)
}

/// Parse manifest XML into a [`PackageRecord`].
pub fn parse_manifest(xml: &str) -> ToteResult<PackageRecord> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut id: Option<String> = None;
    let mut version: Option<String> = None;
    let mut description: Option<String> = None;
    let mut authors: Vec<String> = Vec::new();
    let mut dependencies: Vec<Constraint> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
                if path_context(&path) == "package>metadata>dependencies>dependency" {
                    dependencies.push(dependency_from_attributes(e)?);
                }
            }
            Ok(Event::Empty(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                if path_context(&path) == "package>metadata>dependencies>dependency" {
                    dependencies.push(dependency_from_attributes(e)?);
                }
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                match path_context(&path).as_str() {
                    "package>metadata>id" => id = Some(text_buf.trim().to_string()),
                    "package>metadata>version" => version = Some(text_buf.trim().to_string()),
                    "package>metadata>description" => {
                        description = Some(text_buf.trim().to_string());
                    }
                    "package>metadata>authors" => {
                        authors = text_buf
                            .split(',')
                            .map(str::trim)
                            .filter(|a| !a.is_empty())
                            .map(String::from)
                            .collect();
                    }
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(manifest_error(format!("Failed to parse manifest XML: {e}"))),
            _ => {}
        }
    }

    let id = id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| manifest_error("manifest has no <id>"))?;
    let version = version.ok_or_else(|| manifest_error(format!("manifest for {id} has no <version>")))?;
    let version = Version::parse(&version)
        .map_err(|e| manifest_error(format!("manifest for {id}: {e}")))?;

    let mut record = PackageRecord::new(id, version);
    record.description = description.filter(|d| !d.is_empty());
    record.authors = authors;
    record.dependencies = dependencies;
    Ok(record)
}

fn dependency_from_attributes(e: &BytesStart<'_>) -> ToteResult<Constraint> {
    let mut id: Option<String> = None;
    let mut requirements = String::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| manifest_error(format!("Bad dependency attribute: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| manifest_error(format!("Bad dependency attribute: {e}")))?
            .to_string();
        match attr.key.as_ref() {
            b"id" => id = Some(value),
            b"version" => requirements = value,
            _ => {}
        }
    }
    let id = id.ok_or_else(|| manifest_error("<dependency> is missing its id attribute"))?;
    Constraint::parse(&format!("{id} {requirements}"))
}

fn path_context(path: &[String]) -> String {
    path.join(">")
}

/// Render a record back into manifest XML.
pub fn render_manifest(record: &PackageRecord) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<package>\n  <metadata>\n");
    xml.push_str(&format!("    <id>{}</id>\n", escape(record.id.as_str())));
    xml.push_str(&format!("    <version>{}</version>\n", record.version));
    if let Some(ref description) = record.description {
        xml.push_str(&format!(
            "    <description>{}</description>\n",
            escape(description.as_str())
        ));
    }
    if !record.authors.is_empty() {
        xml.push_str(&format!(
            "    <authors>{}</authors>\n",
            escape(record.authors.join(", ").as_str())
        ));
    }
    if !record.dependencies.is_empty() {
        xml.push_str("    <dependencies>\n");
        for dep in &record.dependencies {
            let requirements = dep.requirements_text();
            if requirements.is_empty() {
                xml.push_str(&format!(
                    "      <dependency id=\"{}\" />\n",
                    escape(dep.id())
                ));
            } else {
                xml.push_str(&format!(
                    "      <dependency id=\"{}\" version=\"{}\" />\n",
                    escape(dep.id()),
                    escape(requirements.as_str())
                ));
            }
        }
        xml.push_str("    </dependencies>\n");
    }
    xml.push_str("  </metadata>\n</package>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package>
  <metadata>
    <id>Foo</id>
    <version>1.2.0</version>
    <description>Does foo things</description>
    <authors>Ann, Bob</authors>
    <dependencies>
      <dependency id="Bar" version="&gt;= 1.0 &lt; 2.0" />
      <dependency id="Baz"></dependency>
      <dependency id="Qux" version="1.1" />
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn parses_metadata_and_dependencies() {
        let record = parse_manifest(MANIFEST).unwrap();
        assert_eq!(record.id, "Foo");
        assert_eq!(record.version.to_string(), "1.2.0");
        assert_eq!(record.description.as_deref(), Some("Does foo things"));
        assert_eq!(record.authors, vec!["Ann", "Bob"]);
        let deps: Vec<String> = record.dependencies.iter().map(|d| d.to_string()).collect();
        assert_eq!(deps, vec!["Bar >= 1.0 < 2.0", "Baz", "Qux = 1.1"]);
    }

    #[test]
    fn missing_version_is_an_error() {
        let xml = "<package><metadata><id>Foo</id></metadata></package>";
        assert!(matches!(parse_manifest(xml), Err(ToteError::Manifest { .. })));
    }

    #[test]
    fn bad_version_is_an_error() {
        let xml = "<package><metadata><id>Foo</id><version>1.x</version></metadata></package>";
        assert!(parse_manifest(xml).is_err());
    }

    #[test]
    fn render_then_parse_preserves_record() {
        let record = parse_manifest(MANIFEST).unwrap();
        let again = parse_manifest(&render_manifest(&record)).unwrap();
        assert_eq!(again, record);
        assert_eq!(again.dependencies, record.dependencies);
        assert_eq!(again.authors, record.authors);
    }
}
