//! Handler for `tote list`.

use miette::Result;

use super::Context;

pub fn exec(ctx: &Context, all: bool, id: Option<&str>) -> Result<()> {
    for catalog in ctx.open_catalogs()? {
        let result = match id {
            Some(id) => catalog.records_with_id(id),
            None if all => catalog.all_records(),
            None => catalog.latest_records(),
        };
        let Some(records) = ctx.tolerate(catalog.as_ref(), result)? else {
            continue;
        };
        for record in records {
            match record.description {
                Some(ref description) => println!("{record} ({}) - {description}", catalog.name()),
                None => println!("{record} ({})", catalog.name()),
            }
        }
    }
    Ok(())
}
