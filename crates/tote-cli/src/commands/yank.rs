//! Handler for `tote yank`.

use miette::Result;
use tote_core::Constraint;
use tote_util::progress;

use super::Context;

pub fn exec(ctx: &Context, constraint: &str, number: usize) -> Result<()> {
    let constraint = Constraint::parse(constraint)?;
    let catalog = ctx.open_catalog(number)?;
    if catalog.yank(&constraint)? {
        progress::status("Yanked", &format!("best match for {constraint} from {}", catalog.name()));
    } else {
        progress::status_warn("Yank", &format!("no version matching {constraint} in {}", catalog.name()));
    }
    Ok(())
}
