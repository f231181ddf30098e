//! Handler for `tote resolve`.

use std::path::PathBuf;

use miette::Result;
use tote_core::manifest::read_manifest;
use tote_core::PackageRecord;
use tote_resolver::{ResolveOptions, Resolver};
use tote_util::errors::ToteResult;
use tote_util::progress;

use super::Context;

pub fn exec(
    ctx: &Context,
    manifests: &[PathBuf],
    tree: bool,
    depth: Option<usize>,
    why: Option<&str>,
) -> Result<()> {
    let roots = manifests
        .iter()
        .map(|path| read_manifest(path))
        .collect::<ToteResult<Vec<PackageRecord>>>()?;
    let catalogs = ctx.open_catalogs()?;

    let spinner = progress::spinner("Resolving dependencies...");
    let result = Resolver::new(&catalogs, ResolveOptions::from(&ctx.config.resolver)).resolve(&roots);
    spinner.finish_and_clear();
    let resolution = result?;

    for name in &resolution.skipped {
        progress::status_warn("Skipped", &format!("catalog {name} was unavailable"));
    }
    for conflict in &resolution.conflicts.conflicts {
        progress::status_warn("Conflict", &conflict.to_string());
    }

    if tree {
        print!("{}", resolution.graph.print_tree(depth));
    } else {
        for package in &resolution.packages {
            println!("{} ({})", package.record, package.source);
        }
    }

    if let Some(id) = why {
        match resolution.graph.find_path(id) {
            Some(path) => {
                let chain: Vec<String> = path.iter().map(ToString::to_string).collect();
                println!("{}", chain.join(" -> "));
            }
            None => progress::status_warn("Why", &format!("{id} is not part of this resolution")),
        }
    }

    let noun = if resolution.len() == 1 { "package" } else { "packages" };
    progress::status("Resolved", &format!("{} {noun}", resolution.len()));
    Ok(())
}
