use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

mod cli;
mod commands;
mod config;
mod hook;

use cli::{Cli, Commands, OutputFormat};
use config::{Config, LogLevel};

fn setup_logging(log_level: &LogLevel) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cc-hooks")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("cc-hooks.log");

    // stdout and stderr belong to Claude Code, so logs only go to the file
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(match log_level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        });
    }

    builder
        .target(env_logger::Target::Pipe(target))
        .try_init()
        .context("Failed to initialize logger")?;

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Run the command, returning the process exit code
fn run(cli: Cli, config: Config) -> Result<i32> {
    match cli.command {
        Commands::Hook { action } => commands::hook::run(action, &config),
        Commands::Check { command } => commands::check::run(&command, &config),
        Commands::Rules { format } => commands::rules::run(OutputFormat::resolve(format), &config).map(|_| 0),
        Commands::Config { action } => commands::config::run(action, &config).map(|_| 0),
        Commands::Completions { shell } => commands::completions::run(shell).map(|_| 0),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // A hook still runs when its log file is unavailable
    let _ = setup_logging(&config.log_level);

    info!("Starting cc-hooks with config from: {:?}", cli.config);

    let code = run(cli, config).context("Command failed")?;
    if code != 0 {
        // process::exit skips destructors; flush what the hook printed
        let _ = std::io::stdout().flush();
        std::process::exit(code);
    }

    Ok(())
}
