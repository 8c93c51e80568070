//! Subcommands module for Conifer CLI
//!
//! This module contains all the subcommand implementations.

pub mod jdbc;
pub mod lookup;

use crate::cli::output::OutputFormatter;
use crate::cli::Cli;
use crate::config::Config;
use anyhow::Result;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, cli.output, cli.verbosity());

        Self { config, output }
    }
}

/// Trait for runnable commands
pub trait Runnable {
    /// Execute the command, returning the process exit code
    fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}
