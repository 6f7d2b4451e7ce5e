//! CLI entry point for the autoindex tool.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app;
mod app_config;
mod cli;

use app::settings::{resolve_default_log_level, resolve_settings};
use cli::Args;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = app_config::load_default_file_config()?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = resolve_default_log_level(&args, file_config.as_ref());
    let no_color = std::env::var_os("NO_COLOR").is_some() || app::terminal::is_dumb_terminal();
    app::terminal::init_tracing(default_level, no_color);

    debug!(?args, "CLI arguments parsed");
    info!("autoindex starting");

    let settings = resolve_settings(&args, file_config.as_ref())?;
    let exit = app::runtime::run(settings, args.quiet).await?;
    Ok(exit.into())
}
