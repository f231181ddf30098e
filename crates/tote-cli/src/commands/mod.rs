//! Command dispatch and handler modules.

mod fetch;
mod list;
mod pack;
mod push;
mod resolve;
mod search;
mod yank;

use std::path::PathBuf;

use miette::Result;
use tote_catalog::Catalog;
use tote_core::config::{CatalogSpec, ToteConfig, UnavailablePolicy};
use tote_util::errors::{ToteError, ToteResult};

use crate::cli::{Cli, Command};

/// Configuration shared by every command.
pub struct Context {
    pub config: ToteConfig,
}

impl Context {
    /// Load `Tote.toml` (or `--config`), replacing its catalogs with any
    /// `--source` locations.
    fn load(config_path: Option<PathBuf>, sources: &[String]) -> ToteResult<Self> {
        let path = config_path.unwrap_or_else(ToteConfig::default_path);
        let mut config = ToteConfig::load(&path)?;
        if !sources.is_empty() {
            config.catalogs = sources.iter().map(|s| CatalogSpec::infer(s)).collect();
        }
        Ok(Self { config })
    }

    /// Open every configured catalog, in order.
    pub fn open_catalogs(&self) -> ToteResult<Vec<Box<dyn Catalog>>> {
        if self.config.catalogs.is_empty() {
            return Err(ToteError::Config {
                message: "No catalogs configured: add [[catalog]] entries to Tote.toml or pass --source"
                    .to_string(),
            });
        }
        tote_catalog::open_all(&self.config)
    }

    /// Open the `number`-th configured catalog (1-based).
    pub fn open_catalog(&self, number: usize) -> ToteResult<Box<dyn Catalog>> {
        let spec = number
            .checked_sub(1)
            .and_then(|i| self.config.catalogs.get(i))
            .ok_or_else(|| ToteError::Config {
                message: format!(
                    "Catalog {number} does not exist ({} configured)",
                    self.config.catalogs.len()
                ),
            })?;
        tote_catalog::open(spec, &self.config.service)
    }

    /// Turn an unavailable catalog into `None` when configured to skip it.
    pub fn tolerate<T>(&self, catalog: &dyn Catalog, result: ToteResult<T>) -> ToteResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_unavailable() && self.config.resolver.unavailable == UnavailablePolicy::Skip => {
                tote_util::progress::status_warn("Skipped", &format!("{}: {e}", catalog.name()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config, &cli.sources)?;
    match cli.command {
        Command::Resolve {
            manifests,
            tree,
            depth,
            why,
        } => resolve::exec(&ctx, &manifests, tree, depth, why.as_deref()),
        Command::List { all, id } => list::exec(&ctx, all, id.as_deref()),
        Command::Search { constraint } => search::exec(&ctx, &constraint),
        Command::Fetch {
            constraint,
            dest,
            extract,
        } => fetch::exec(&ctx, &constraint, &dest, extract),
        Command::Pack {
            manifest,
            files,
            out,
        } => pack::exec(&manifest, &files, &out),
        Command::Push { archive, catalog } => push::exec(&ctx, &archive, catalog),
        Command::Yank {
            constraint,
            catalog,
        } => yank::exec(&ctx, &constraint, catalog),
    }
}
