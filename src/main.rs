mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod prompt;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use stackkit::CancelToken;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub cancel: CancelToken,
}

fn main() {
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

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::warn!("Interrupted, stopping after the current check");
        handler_token.cancel();
    }) {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }

    let ctx = Context {
        quiet: cli.quiet,
        cancel,
    };

    if let Err(e) = run(&ctx, cli) {
        // A stage failure already names its cause
        if e.is::<stackkit::Failure>() {
            log::error!("{}", e);
        } else {
            log::error!("{:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "furnace", &mut io::stdout());
        return Ok(());
    }

    let config_dir = paths::config_dir(cli.config_dir.as_deref())?;
    let settings = Settings::load(&config_dir, cli.provider.map(Into::into))?;
    log::debug!("Settings: {:?}", settings);

    match cli.command {
        Command::Create(args) => commands::create::run(ctx, &settings, args.name.as_deref()),
        Command::Delete(args) => commands::delete::run(ctx, &settings, args.name.as_deref()),
        Command::Status(args) => commands::status::run(ctx, &settings, args.name.as_deref()),
        Command::Config => commands::config::run(&settings),
        Command::Completions { .. } => Ok(()),
    }
}
