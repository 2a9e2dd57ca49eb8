mod cli;
mod commands;
mod config;
mod engine;
mod mapping;
mod resource;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub settings: Settings,
}

fn main() -> Result<()> {
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        settings: Settings::from_cli(&cli),
    };

    match cli.command {
        Command::Plan(args) => commands::declarative::plan(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::declarative::apply(
            &ctx,
            args.target.as_deref(),
            args.dry_run,
            args.yes,
        ),
        Command::Validate => commands::declarative::validate(&ctx),
        Command::Show(args) => {
            commands::show::run(&ctx, args.resource_type, &args.identity, args.decrypt)
        }
        Command::Import(args) => commands::import::run(&ctx, &args.address, &args.identity),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cfsync", &mut io::stdout());
            Ok(())
        }
    }
}
