//! Output formatting for the Conifer CLI
//!
//! Human output is colored unless disabled; JSON and YAML output are meant
//! for scripts and never colored.

use super::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use std::io::{self, Write};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Output mode
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    /// Print lookup results.
    ///
    /// Human mode prints each scalar on its own line and each record as
    /// `field: value` lines, with records separated by a blank line.
    pub fn values(&self, values: &[serde_json::Value]) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(values)?),
            OutputFormat::Human => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 && value.is_object() {
                        println!();
                    }
                    self.human_value(value);
                }
            }
        }
        Ok(())
    }

    fn human_value(&self, value: &serde_json::Value) {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Object(map) if map.is_empty() => {
                if self.use_color {
                    println!("{}", "{}".bright_black());
                } else {
                    println!("{{}}");
                }
            }
            serde_json::Value::Object(map) => {
                let width = map.keys().map(String::len).max().unwrap_or(0);
                for (field, v) in map {
                    let v = v.as_str().map_or_else(|| v.to_string(), str::to_string);
                    if self.use_color {
                        println!("{:width$}  {}", field.cyan().bold(), v, width = width);
                    } else {
                        println!("{:width$}  {}", field, v, width = width);
                    }
                }
            }
            other => println!("{}", other),
        }
    }

    /// Print a single translated string
    pub fn text(&self, key: &str, value: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let mut out = serde_json::Map::new();
                out.insert(key.to_string(), value.into());
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Yaml => {
                let mut out = serde_yaml::Mapping::new();
                out.insert(key.into(), value.into());
                print!("{}", serde_yaml::to_string(&out)?);
            }
            OutputFormat::Human => println!("{}", value),
        }
        Ok(())
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.format == OutputFormat::Json {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.format != OutputFormat::Human {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 || self.format != OutputFormat::Human {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "DEBUG:".magenta(), message);
        } else {
            eprintln!("DEBUG: {}", message);
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_in_every_format() {
        let values = vec![
            serde_json::json!({"name": "web01", "ip": "10.0.0.1"}),
            serde_json::json!("10.0.0.2"),
            serde_json::json!({}),
        ];

        for format in [OutputFormat::Human, OutputFormat::Json, OutputFormat::Yaml] {
            let out = OutputFormatter::new(false, format, 0);
            assert!(out.values(&values).is_ok());
        }
    }

    #[test]
    fn test_text_in_every_format() {
        for format in [OutputFormat::Human, OutputFormat::Json, OutputFormat::Yaml] {
            let out = OutputFormatter::new(true, format, 0);
            assert!(out.text("dbi", "dbi:Pg:dbname=d").is_ok());
        }
    }
}
