//! Handler for `tote pack`.

use std::path::{Path, PathBuf};

use miette::Result;
use tote_catalog::archive;
use tote_util::progress;

pub fn exec(manifest: &Path, files: &[PathBuf], out: &Path) -> Result<()> {
    let path = archive::pack(manifest, files, out)?;
    let digest = tote_util::hash::sha256_file(&path).map_err(tote_util::errors::ToteError::Io)?;
    println!("{}", path.display());
    progress::status("Packed", &format!("sha256 {digest}"));
    Ok(())
}
