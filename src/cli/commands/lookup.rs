//! Lookup command - columnar file queries
//!
//! Each query is a colfile term: `<key> src=<path-or-url> [col=<index-or-field>] [retry=<n>]`.

use super::{CommandContext, Runnable};
use crate::config::Config;
use anyhow::Result;
use clap::Parser;
use conifer::plugins::lookup::{ErrorBehavior, LookupContext, LookupOptions, LookupRegistry};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the lookup command
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    /// Colfile queries, e.g. "web01 src=hosts.txt col=ip"
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Directory to search for relative sources (repeatable)
    #[arg(long = "search-path", action = clap::ArgAction::Append)]
    pub search_paths: Vec<PathBuf>,

    /// Base directory for relative sources
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Seconds to wait between remote attempts
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip server certificate validation
    #[arg(long)]
    pub no_validate_certs: bool,

    /// Fail when a named field is missing from the matched record
    #[arg(long)]
    pub strict_fields: bool,

    /// What to do when a query fails: strict, ignore or warn
    #[arg(long)]
    pub errors: Option<ErrorBehavior>,
}

impl LookupArgs {
    /// Configuration values overridden by the flags given on the command line
    fn lookup_context(&self, config: &Config) -> LookupContext {
        let mut context = config.lookup_context();

        context.search_paths.extend(self.search_paths.iter().cloned());
        if let Some(dir) = &self.work_dir {
            context = context.with_work_dir(dir);
        }
        if let Some(delay) = self.retry_delay {
            context = context.with_retry_delay(Duration::from_secs(delay));
        }
        if let Some(timeout) = self.timeout {
            context = context.with_timeout(timeout);
        }
        if self.no_validate_certs {
            context = context.with_validate_certs(false);
        }
        if self.strict_fields {
            context = context.with_strict_fields(true);
        }

        context
    }
}

impl Runnable for LookupArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        let context = self.lookup_context(&ctx.config);
        let options =
            LookupOptions::new().with_errors(self.errors.unwrap_or(ctx.config.lookup.errors));

        ctx.output.debug(&format!(
            "search paths: {:?}, retry delay: {:?}, validate certs: {}",
            context.search_paths, context.retry_delay, context.validate_certs
        ));

        let registry = LookupRegistry::with_builtins();
        let queries: Vec<&str> = self.queries.iter().map(String::as_str).collect();

        match registry.lookup_with_options("colfile", &queries, &options, &context) {
            Ok(values) => {
                ctx.output
                    .info(&format!("{} result(s) for {} query(ies)", values.len(), queries.len()));
                ctx.output.values(&values)?;
                ctx.output.flush();
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(1)
            }
        }
    }
}
