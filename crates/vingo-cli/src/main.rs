// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `vingo` command-line entry point.
//!
//! - `vingo render` renders a template file against JSON data
//! - `vingo check` compiles templates and reports parse errors
//! - `vingo init` writes editor file associations for `.vgo` templates

mod commands;
mod diagnostic;

use std::process::exit;

use clap::{Parser, Subcommand};
use commands::{run_check, run_init, run_render, CheckArgs, InitArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "VINGO_LOG";

/// Render and check vingo templates.
#[derive(Debug, Parser)]
#[command(name = "vingo")]
#[command(about = "Render and check vingo templates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log engine activity (cache hits, compilations) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a template file to stdout
    Render(RenderArgs),
    /// Compile template files and report errors
    Check(CheckArgs),
    /// Write editor settings associating .vgo files with HTML
    #[command(alias = "create")]
    Init(InitArgs),
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Check(args) => run_check(&args),
        Commands::Init(args) => run_init(&args),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
