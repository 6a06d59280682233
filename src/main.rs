//! wttp - publish a web app's assets into a chunked resource store.

mod asset;
mod cli;
mod codec;
mod config;
mod error;
mod hooks;
mod logger;
mod pinning;
mod pipeline;
mod publish;
mod report;
mod rewrite;
mod store;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::PublishConfig;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(err) = run(&cli) {
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Arc::new(PublishConfig::load(cli)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(pipeline::run(cli, config))
}
