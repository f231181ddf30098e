//! Package archives: zip files named `<id>-<version>.tpkg` with the
//! manifest stored as `package.xml` at the root.

use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use tote_core::manifest::{self, MANIFEST_FILE_NAME};
use tote_core::PackageRecord;
use tote_util::errors::{ToteError, ToteResult};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn archive_error(path: &Path, e: impl std::fmt::Display) -> ToteError {
    ToteError::Archive {
        message: format!("{}: {e}", path.display()),
    }
}

/// Whether `path` has the package archive extension.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(tote_core::ARCHIVE_EXTENSION))
}

/// Read the manifest embedded in an archive on disk.
pub fn read_record(path: &Path) -> ToteResult<PackageRecord> {
    let file = File::open(path).map_err(|e| archive_error(path, e))?;
    read_record_from(file, path)
}

/// Read the manifest embedded in an in-memory archive.
pub fn read_record_bytes(bytes: &[u8]) -> ToteResult<PackageRecord> {
    read_record_from(std::io::Cursor::new(bytes), Path::new("<memory>"))
}

fn read_record_from<R: Read + Seek>(reader: R, path: &Path) -> ToteResult<PackageRecord> {
    let mut zip = ZipArchive::new(reader).map_err(|e| archive_error(path, e))?;
    let mut entry = zip.by_name(MANIFEST_FILE_NAME).map_err(|e| {
        archive_error(path, format!("missing {MANIFEST_FILE_NAME}: {e}"))
    })?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| archive_error(path, e))?;
    manifest::parse_manifest(&xml).map_err(|e| archive_error(path, e))
}

/// Build an archive from a manifest file plus content files or directories.
///
/// The archive is written to `out_dir` under its canonical file name and the
/// path is returned. Directories are added recursively under their own name.
pub fn pack(manifest_path: &Path, files: &[PathBuf], out_dir: &Path) -> ToteResult<PathBuf> {
    let record = manifest::read_manifest(manifest_path)?;
    tote_util::fs::ensure_dir(out_dir)?;
    let out_path = out_dir.join(record.archive_file_name());

    let file = File::create(&out_path).map_err(|e| archive_error(&out_path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    zip.start_file(MANIFEST_FILE_NAME, options)
        .map_err(|e| archive_error(&out_path, e))?;
    zip.write_all(manifest::render_manifest(&record).as_bytes())
        .map_err(|e| archive_error(&out_path, e))?;

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| archive_error(path, "has no file name"))?;
        if name == MANIFEST_FILE_NAME {
            continue;
        }
        add_path(&mut zip, path, &name, options).map_err(|e| archive_error(path, e))?;
    }

    zip.finish().map_err(|e| archive_error(&out_path, e))?;
    tracing::info!("packed {record} into {}", out_path.display());
    Ok(out_path)
}

fn add_path(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> Result<(), String> {
    if path.is_dir() {
        let mut children: Vec<_> = fs::read_dir(path)
            .map_err(|e| e.to_string())?
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?;
        children.sort_by_key(|e| e.file_name());
        for child in children {
            let child_name = format!("{name}/{}", child.file_name().to_string_lossy());
            add_path(zip, &child.path(), &child_name, options)?;
        }
        Ok(())
    } else {
        zip.start_file(name, options).map_err(|e| e.to_string())?;
        let mut source = File::open(path).map_err(|e| e.to_string())?;
        std::io::copy(&mut source, zip).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Extract an archive into `dest`. Entries with unsafe paths are skipped.
/// Returns the number of files written.
pub fn unpack(archive: &Path, dest: &Path) -> ToteResult<u64> {
    let file = File::open(archive).map_err(|e| archive_error(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| archive_error(archive, e))?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("skipping unsafe entry '{}' in {}", entry.name(), archive.display());
            continue;
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            tote_util::fs::ensure_dir(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            tote_util::fs::ensure_dir(parent)?;
        }
        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out).map_err(|e| archive_error(archive, e))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<package><metadata>
        <id>Foo</id><version>1.2</version>
        <dependencies><dependency id="Bar" version="&gt;= 1.0" /></dependencies>
    </metadata></package>"#;

    #[test]
    fn pack_then_read_record() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest_path = tmp.path().join("package.xml");
        fs::write(&manifest_path, MANIFEST).unwrap();
        let content = tmp.path().join("readme.txt");
        fs::write(&content, "hello").unwrap();

        let archive = pack(&manifest_path, &[content], &tmp.path().join("out")).unwrap();
        assert_eq!(archive.file_name().unwrap(), "Foo-1.2.tpkg");
        assert!(is_archive(&archive));

        let record = read_record(&archive).unwrap();
        assert_eq!(record.to_string(), "Foo 1.2");
        assert_eq!(record.dependencies[0].to_string(), "Bar >= 1.0");

        let bytes = fs::read(&archive).unwrap();
        assert_eq!(read_record_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn unpack_restores_content() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest_path = tmp.path().join("package.xml");
        fs::write(&manifest_path, MANIFEST).unwrap();
        let lib = tmp.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(lib.join("foo.dll"), [0u8, 1, 2]).unwrap();

        let archive = pack(&manifest_path, &[lib], tmp.path()).unwrap();
        let dest = tmp.path().join("unpacked");
        assert_eq!(unpack(&archive, &dest).unwrap(), 2);
        assert_eq!(fs::read(dest.join("lib/foo.dll")).unwrap(), vec![0u8, 1, 2]);
        assert!(dest.join(MANIFEST_FILE_NAME).is_file());
    }

    #[test]
    fn not_a_zip_is_an_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("Foo-1.0.tpkg");
        fs::write(&bogus, "not a zip").unwrap();
        assert!(matches!(read_record(&bogus), Err(ToteError::Archive { .. })));
    }
}
