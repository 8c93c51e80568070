//! Conifer - columnar lookups and JDBC translation
//!
//! This is the main entry point for the Conifer CLI.

mod cli;
mod config;

use anyhow::Result;
use cli::commands::{CommandContext, Runnable};
use cli::{Cli, Commands};
use config::{Config, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration; a file the user named must load
    let config = match Config::load(cli.config.as_ref()) {
        Err(e) if cli.config.is_some() => return Err(e),
        loaded => loaded,
    };

    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(cli.verbosity(), &logging);

    let config = config.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {:#}", e);
        Config::default()
    });

    tracing::debug!("conifer v{}", VERSION);

    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Lookup(args) => args.run(&mut ctx)?,
        Commands::Dbi(args) => args.run(&mut ctx)?,
        Commands::ShortName(args) => args.run(&mut ctx)?,
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level and logging config
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_deref().unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity >= 3),
            )
            .with(env_filter)
            .init();
    }
}
