//! livefront - dependency-aware rebuilds and live reload for front-end sources.

#![allow(dead_code)]

mod actor;
mod cli;
mod config;
mod core;
mod dialect;
mod embed;
mod engine;
mod logger;
mod reload;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

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
    logger::set_verbose(cli.verbose);

    let config = Arc::new(Config::load(&cli)?);

    match &cli.command {
        Commands::Compile {
            watch,
            serve,
            live,
            ..
        } => {
            let live = live.is_some();
            cli::compile::run(&config, *watch || live, serve.is_some() || live)
        }
        Commands::Serve { compile, .. } => cli::serve::command(&config, *compile),
        Commands::Minify { args } => cli::minify::run(&config, args),
    }
}
