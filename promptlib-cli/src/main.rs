//! promptlib: a prompt library on the command line.
//!
//! Parses arguments, sets up logging and configuration, then dispatches to the command handlers.

mod cli;
mod commands;
mod config;
mod interactive;

use std::process::ExitCode;

use cli::Cli;
use commands::AppContext;
use config::Config;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let library_path = commands::resolve_library_path(&config, cli.library.as_deref())?;
    let ctx = AppContext { config, library_path };
    commands::dispatch(cli.command, &ctx)
}
