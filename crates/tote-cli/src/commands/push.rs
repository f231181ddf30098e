//! Handler for `tote push`.

use std::path::Path;

use miette::Result;
use tote_util::progress;

use super::Context;

pub fn exec(ctx: &Context, archive: &Path, number: usize) -> Result<()> {
    let catalog = ctx.open_catalog(number)?;
    match catalog.push(archive)? {
        Some(record) => progress::status("Pushed", &format!("{record} to {}", catalog.name())),
        None => progress::status_warn(
            "Skipped",
            &format!("{} already exists in {}", archive.display(), catalog.name()),
        ),
    }
    Ok(())
}
