//! Catalog backed by a static XML feed.
//!
//! ```xml
//! <feed>
//!   <entry>
//!     <id>Foo</id>
//!     <version>1.2</version>
//!     <summary>Does foo things</summary>
//!     <content src="packages/Foo-1.2.tpkg" />
//!     <dependency>Bar &gt;= 1.0</dependency>
//!   </entry>
//! </feed>
//! ```
//!
//! The feed is parsed once when the catalog is built. Entries that fail to
//! parse are logged and skipped. Feeds are read-only.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tote_core::{Constraint, PackageRecord, Version};
use tote_util::errors::{ToteError, ToteResult};

use crate::Catalog;

#[derive(Debug, Clone)]
struct FeedEntry {
    record: PackageRecord,
    content: Option<PathBuf>,
}

/// Fields collected for one `<entry>` before it is validated.
#[derive(Debug, Default)]
struct RawEntry {
    id: String,
    version: String,
    summary: Option<String>,
    content: Option<String>,
    dependencies: Vec<String>,
}

impl RawEntry {
    fn build(self, base_dir: Option<&Path>) -> ToteResult<FeedEntry> {
        if self.id.is_empty() {
            return Err(ToteError::Manifest {
                message: "feed entry has no <id>".to_string(),
            });
        }
        let mut record = PackageRecord::new(self.id, Version::parse(&self.version)?);
        record.description = self.summary.filter(|s| !s.is_empty());
        for dependency in &self.dependencies {
            record.dependencies.push(Constraint::parse(dependency)?);
        }
        let content = self.content.map(|src| match base_dir {
            Some(dir) if Path::new(&src).is_relative() => dir.join(src),
            _ => PathBuf::from(src),
        });
        Ok(FeedEntry { record, content })
    }
}

/// In-memory catalog over a fixed list of records.
#[derive(Debug, Clone)]
pub struct FeedCatalog {
    location: String,
    name: Option<String>,
    entries: Vec<FeedEntry>,
}

impl FeedCatalog {
    /// A feed over already-built records, without archive content.
    pub fn from_records(location: impl Into<String>, records: Vec<PackageRecord>) -> Self {
        let mut feed = Self {
            location: location.into(),
            name: None,
            entries: Vec::new(),
        };
        feed.entries = records
            .into_iter()
            .map(|r| FeedEntry {
                record: r.with_source(feed.location.clone()),
                content: None,
            })
            .collect();
        feed
    }

    /// Parse feed XML. Relative `content src` paths resolve against `base_dir`.
    pub fn from_xml(location: impl Into<String>, xml: &str, base_dir: Option<&Path>) -> ToteResult<Self> {
        let location = location.into();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut text_buf = String::new();
        let mut current: Option<RawEntry> = None;
        let mut entries = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    path.push(local_name(e));
                    text_buf.clear();
                    match path_context(&path).as_str() {
                        "feed>entry" => current = Some(RawEntry::default()),
                        "feed>entry>content" => set_content(&mut current, e),
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    path.push(local_name(e));
                    if path_context(&path) == "feed>entry>content" {
                        set_content(&mut current, e);
                    }
                    path.pop();
                }
                Ok(Event::Text(ref e)) => {
                    text_buf = e.unescape().unwrap_or_default().to_string();
                }
                Ok(Event::End(_)) => {
                    let text = text_buf.trim().to_string();
                    if let Some(raw) = current.as_mut() {
                        match path_context(&path).as_str() {
                            "feed>entry>id" => raw.id = text,
                            "feed>entry>version" => raw.version = text,
                            "feed>entry>summary" => raw.summary = Some(text),
                            "feed>entry>dependency" => raw.dependencies.push(text),
                            _ => {}
                        }
                    }
                    if path_context(&path) == "feed>entry" {
                        if let Some(raw) = current.take() {
                            let label = format!("{} {}", raw.id, raw.version);
                            match raw.build(base_dir) {
                                Ok(entry) => entries.push(entry),
                                Err(e) => {
                                    tracing::warn!("skipping feed entry '{label}' in {location}: {e}");
                                }
                            }
                        }
                    }
                    path.pop();
                    text_buf.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ToteError::Manifest {
                        message: format!("Failed to parse feed {location}: {e}"),
                    });
                }
                _ => {}
            }
        }

        let mut feed = Self {
            location,
            name: None,
            entries,
        };
        let source = feed.location.clone();
        for entry in &mut feed.entries {
            entry.record.source = Some(source.clone());
        }
        tracing::debug!("loaded {} entries from feed {}", feed.entries.len(), feed.location);
        Ok(feed)
    }

    /// Read and parse a feed file.
    pub fn load(path: &Path) -> ToteResult<Self> {
        let location = path.display().to_string();
        let xml = std::fs::read_to_string(path).map_err(|e| ToteError::CatalogUnavailable {
            catalog: location.clone(),
            message: format!("cannot read feed: {e}"),
        })?;
        Self::from_xml(location, &xml, path.parent())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        for entry in &mut self.entries {
            entry.record.source = Some(name.clone());
        }
        self.name = Some(name);
        self
    }

    fn read_only(&self, operation: &str) -> ToteError {
        ToteError::ReadOnlyCatalog {
            catalog: self.name().to_string(),
            operation: operation.to_string(),
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

fn path_context(path: &[String]) -> String {
    path.join(">")
}

fn set_content(current: &mut Option<RawEntry>, e: &BytesStart<'_>) {
    let Some(raw) = current.as_mut() else {
        return;
    };
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"src" {
            if let Ok(value) = attr.unescape_value() {
                raw.content = Some(value.to_string());
            }
        }
    }
}

impl Catalog for FeedCatalog {
    fn location(&self) -> &str {
        &self.location
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }

    fn all_records(&self) -> ToteResult<Vec<PackageRecord>> {
        Ok(self.entries.iter().map(|e| e.record.clone()).collect())
    }

    fn fetch(&self, constraint: &Constraint, dest: &Path) -> ToteResult<Option<PathBuf>> {
        let Some(best) = self.get(constraint)? else {
            return Ok(None);
        };
        let Some(entry) = self.entries.iter().find(|e| e.record == best) else {
            return Ok(None);
        };
        let source = entry.content.as_ref().ok_or_else(|| ToteError::Archive {
            message: format!("feed entry {best} in {} has no content", self.name()),
        })?;
        tote_util::fs::ensure_dir(dest)?;
        let target = dest.join(best.archive_file_name());
        std::fs::copy(source, &target).map_err(|e| ToteError::Archive {
            message: format!("cannot copy {}: {e}", source.display()),
        })?;
        Ok(Some(target))
    }

    fn push(&self, _archive: &Path) -> ToteResult<Option<PackageRecord>> {
        Err(self.read_only("push"))
    }

    fn yank(&self, _constraint: &Constraint) -> ToteResult<bool> {
        Err(self.read_only("yank"))
    }
}
