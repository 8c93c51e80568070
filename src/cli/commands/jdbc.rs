//! JDBC commands - `dbi` and `short-name`

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use conifer::plugins::filter::{to_dbi_string, to_short_name};

/// Arguments for the dbi command
#[derive(Parser, Debug, Clone)]
pub struct DbiArgs {
    /// JDBC URL to translate
    pub url: String,
}

/// Arguments for the short-name command
#[derive(Parser, Debug, Clone)]
pub struct ShortNameArgs {
    /// JDBC URL to shorten
    pub url: String,
}

impl Runnable for DbiArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.debug(&format!("Translating '{}'", self.url));

        match to_dbi_string(&self.url) {
            Ok(dbi) => {
                ctx.output.text("dbi", &dbi)?;
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(1)
            }
        }
    }
}

impl Runnable for ShortNameArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.debug(&format!("Shortening '{}'", self.url));

        match to_short_name(&self.url) {
            Ok(name) => {
                ctx.output.text("short_name", &name)?;
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(1)
            }
        }
    }
}
