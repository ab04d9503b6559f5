//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quire static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file name, relative to the site directory (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml", global = true)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the `build` command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Site directory containing the config, content and templates
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory (overrides `[build.output]`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Publish documents marked as drafts
    #[arg(long)]
    pub drafts: bool,

    /// Clean output directory completely before writing
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful for CI deployments where the production URL differs from local previews.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template site
    Init {
        /// the name(path) of the new site directory
        name: Option<PathBuf>,
    },

    /// Render every document and write the site to the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

impl Cli {
    /// Site directory the command operates on.
    pub fn root(&self) -> PathBuf {
        let dir = match &self.command {
            Commands::Init { name } => name.as_ref(),
            Commands::Build { build_args } => build_args.source.as_ref(),
        };
        dir.cloned().unwrap_or_else(|| PathBuf::from("./"))
    }
}
