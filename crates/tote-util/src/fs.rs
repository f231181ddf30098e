use std::path::{Path, PathBuf};

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Recursively copy `src` into `dest`, creating `dest` if needed.
/// Returns the number of files copied.
pub fn copy_dir_all(src: &Path, dest: &Path) -> std::io::Result<u64> {
    ensure_dir(dest)?;
    let mut copied = 0;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy a single file into `dest_dir`, keeping its file name.
/// Returns the path of the new copy.
pub fn copy_into(file: &Path, dest_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(dest_dir)?;
    let name = file.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", file.display()),
        )
    })?;
    let target = dest_dir.join(name);
    std::fs::copy(file, &target)?;
    Ok(target)
}
