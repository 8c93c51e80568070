//! CLI module for Conifer
//!
//! This module provides the command-line interface for Conifer,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Conifer - columnar lookups and JDBC translation
///
/// Look up records in whitespace-delimited columnar files from a path or URL,
/// and translate JDBC connection strings to DBI data sources.
#[derive(Parser, Debug, Clone)]
#[command(name = "conifer")]
#[command(author = "Conifer Contributors")]
#[command(version)]
#[command(about = "Columnar lookups and JDBC-to-DBI translation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short = 'o', long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "CONIFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Look up records in columnar files
    Lookup(commands::lookup::LookupArgs),

    /// Translate a JDBC URL into a DBI data source string
    Dbi(commands::jdbc::DbiArgs),

    /// Extract the short database name from a JDBC URL
    #[command(name = "short-name")]
    ShortName(commands::jdbc::ShortNameArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["conifer", "dbi", "jdbc:oracle:oci:@svc"]).unwrap();
        assert!(matches!(cli.command, Commands::Dbi(_)));
        assert_eq!(cli.output, OutputFormat::Human);
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["conifer", "-vvvvv", "short-name", "x"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_lookup_args() {
        let cli = Cli::try_parse_from([
            "conifer",
            "-o",
            "json",
            "lookup",
            "web01 src=hosts.txt",
            "db01 src=hosts.txt col=1",
            "--search-path",
            "/a",
            "--search-path",
            "/b",
            "--errors",
            "warn",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.queries.len(), 2);
                assert_eq!(args.search_paths.len(), 2);
                assert_eq!(
                    args.errors,
                    Some(conifer::plugins::lookup::ErrorBehavior::Warn)
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_requires_query() {
        assert!(Cli::try_parse_from(["conifer", "lookup"]).is_err());
    }
}
