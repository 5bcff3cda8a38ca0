mod cli;
mod commands;
mod lock;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use convergence::EXIT_PLAN_FAILURE;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let result = match &cli.command {
        Commands::Plan => commands::plan::run(&cli.manifest),
        Commands::Apply(args) => commands::apply::run(&cli.manifest, args),
        Commands::Facts => commands::facts::run(&cli.manifest),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "groundwork", &mut io::stdout());
            Ok(convergence::EXIT_OK)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            ui::error(&format!("{err:#}"));
            // Anything that fails before execution starts is a planning
            // failure: unreadable manifest, parse error, invalid spec,
            // cycle, contended run lock.
            ExitCode::from(EXIT_PLAN_FAILURE)
        }
    }
}
