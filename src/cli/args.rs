//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Publish a web app's assets into a chunked resource store
#[derive(Parser, Debug, Clone)]
#[command(name = "wttp", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: wttp.toml)
    #[arg(short = 'C', long, global = true, default_value = "wttp.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the whole pipeline: clean, compile, deploy, rewrite, build, publish
    #[command(visible_alias = "d")]
    Deploy {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Rewrite source asset references against an existing store
    #[command(visible_alias = "r")]
    Rewrite {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Publish the built entry document and bundles to an existing store
    #[command(visible_alias = "p")]
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },
}

/// Arguments shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Network name (e.g. polygon_mainnet), overrides `[network] name`
    #[arg(short, long)]
    pub network: Option<String>,

    /// Resource store address; skips the deploy stage when given
    #[arg(short, long)]
    pub address: Option<String>,

    /// Fail the run on the first partially uploaded resource
    #[arg(short, long)]
    pub strict: bool,

    /// Use an in-memory store and local hashes instead of remote services
    #[arg(long)]
    pub dry_run: bool,

    /// Chunk size in characters, overrides `[store] chunk_size`
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl Cli {
    pub fn args(&self) -> &PublishArgs {
        match &self.command {
            Commands::Deploy { args } | Commands::Rewrite { args } | Commands::Publish { args } => {
                args
            }
        }
    }
}
