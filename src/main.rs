//! tola-rev - content-hash versioning for static assets.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod logger;
mod rev;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::RevConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = RevConfig::load(&cli)?;
    let request = config.request(cli.run_args());

    match &cli.command {
        Commands::Version { .. } => {
            let report = rev::run(&config, &request)?;
            debug!("version"; "manifest: {}", report.manifest_path.display());
            Ok(())
        }
        Commands::Watch { .. } => watch::watch(&config, &request),
    }
}
