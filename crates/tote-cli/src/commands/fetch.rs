//! Handler for `tote fetch`.

use std::path::Path;

use miette::Result;
use tote_catalog::archive;
use tote_core::Constraint;
use tote_util::errors::ToteError;
use tote_util::progress;

use super::Context;

pub fn exec(ctx: &Context, constraint: &str, dest: &Path, extract: bool) -> Result<()> {
    let constraint = Constraint::parse(constraint)?;
    for catalog in ctx.open_catalogs()? {
        let result = catalog.fetch(&constraint, dest);
        let Some(Some(path)) = ctx.tolerate(catalog.as_ref(), result)? else {
            continue;
        };
        progress::status(
            "Fetched",
            &format!("{} from {}", path.display(), catalog.name()),
        );
        if extract && archive::is_archive(&path) {
            let target = path.with_extension("");
            let count = archive::unpack(&path, &target)?;
            progress::status("Extracted", &format!("{count} files to {}", target.display()));
        }
        return Ok(());
    }
    Err(ToteError::Generic {
        message: format!("No catalog provides {constraint}"),
    }
    .into())
}
