//! CLI argument definitions.
//!
//! Every command is a variant of [`Command`] with a handler of the same
//! name in [`super::commands`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tote",
    version,
    about = "Resolve and publish packages across catalogs",
    long_about = "tote resolves package dependencies against an ordered list of catalogs: \
                  local archive directories, remote catalog services, and static XML feeds."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./Tote.toml)
    #[arg(long, global = true, env = "TOTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog location to use instead of the configured ones (repeatable)
    #[arg(short, long = "source", global = true, value_name = "LOCATION")]
    pub sources: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the dependencies of one or more package manifests
    Resolve {
        /// Manifests (package.xml) of the root packages
        #[arg(required = true)]
        manifests: Vec<PathBuf>,
        /// Print the resolution as a dependency tree
        #[arg(long)]
        tree: bool,
        /// Maximum tree depth
        #[arg(long, requires = "tree")]
        depth: Option<usize>,
        /// Show which chain of packages pulls in this id
        #[arg(long, value_name = "ID")]
        why: Option<String>,
    },

    /// List packages in every catalog
    List {
        /// Show every version instead of the latest
        #[arg(short, long)]
        all: bool,
        /// Only versions of this id
        #[arg(long)]
        id: Option<String>,
    },

    /// Find packages matching a constraint, e.g. "Foo >= 1.0 < 2.0"
    Search {
        constraint: String,
    },

    /// Download the best match for a constraint
    Fetch {
        constraint: String,
        /// Destination directory
        dest: PathBuf,
        /// Unpack the fetched archive next to it
        #[arg(long)]
        extract: bool,
    },

    /// Build a package archive from a manifest and content files
    Pack {
        /// The package manifest (package.xml)
        manifest: PathBuf,
        /// Files or directories to include
        files: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Publish an archive to a catalog
    Push {
        archive: PathBuf,
        /// Target catalog, 1-based in configured order
        #[arg(long, default_value_t = 1)]
        catalog: usize,
    },

    /// Remove the best match for a constraint from a catalog
    Yank {
        constraint: String,
        /// Target catalog, 1-based in configured order
        #[arg(long, default_value_t = 1)]
        catalog: usize,
    },
}

/// Parse CLI arguments from `std::env::args`.
pub fn parse() -> Cli {
    Cli::parse()
}
