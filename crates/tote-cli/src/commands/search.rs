//! Handler for `tote search`.

use miette::Result;
use tote_core::Constraint;
use tote_util::progress;

use super::Context;

pub fn exec(ctx: &Context, constraint: &str) -> Result<()> {
    let constraint = Constraint::parse(constraint)?;
    let mut found = 0usize;
    for catalog in ctx.open_catalogs()? {
        let result = catalog.records_matching(std::slice::from_ref(&constraint));
        let Some(records) = ctx.tolerate(catalog.as_ref(), result)? else {
            continue;
        };
        for record in records {
            println!("{record} ({})", catalog.name());
            found += 1;
        }
    }
    if found == 0 {
        progress::status_warn("Search", &format!("nothing matches {constraint}"));
    }
    Ok(())
}
