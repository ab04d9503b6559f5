//! quire - a static site generator for personal websites.

#[macro_use]
mod logger;

mod cli;
mod config;
mod content;
mod error;
mod init;
mod render;
mod site;
mod template;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use logger::ProgressBars;
use std::{process::ExitCode, time::Instant};
use template::TemplateResolver;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = SiteConfig::load(cli)?;

    match &cli.command {
        Commands::Init { name } => {
            new_site(&config, name.is_some())?;
            log!("init"; "created new site in {}", config.root().display());
            Ok(())
        }
        Commands::Build { .. } => build_all(&config),
    }
}

/// Load content and templates, render everything, then write the output.
fn build_all(config: &SiteConfig) -> Result<()> {
    let start = Instant::now();

    let documents = content::load(config).context("Failed to load content")?;
    let resolver = TemplateResolver::load(&config.build.templates)
        .context("Failed to load templates")?;
    resolver.validate()?;
    log!(
        "build";
        "{} documents, {} templates",
        documents.len(),
        resolver.len()
    );

    let output = {
        let progress = ProgressBars::new_filtered(&[("render", documents.len())]);
        site::build(&documents, &resolver, config, || {
            if let Some(progress) = &progress {
                progress.inc("render");
            }
        })?
    };

    let summary = site::write(&output, config)?;
    log!(
        "write";
        "{} pages, {} assets -> {} ({:.2?})",
        summary.pages,
        summary.assets,
        config.build.output.display(),
        start.elapsed()
    );
    Ok(())
}
