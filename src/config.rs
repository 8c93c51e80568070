//! Configuration module for Conifer
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/conifer/conifer.cfg)
//! - User configuration (~/.conifer.cfg)
//! - Project configuration (./conifer.cfg)
//! - Environment variables
//! - Command-line arguments (applied by the commands)

use anyhow::{bail, Context, Result};
use conifer::plugins::lookup::{
    ErrorBehavior, LookupContext, DEFAULT_RETRY, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote fetch settings
    pub fetch: FetchConfig,

    /// Lookup settings
    pub lookup: LookupConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Remote fetch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Additional attempts for remote sources when a term has no `retry=`
    pub retry: u32,

    /// Seconds to wait between attempts
    pub retry_delay: u64,

    /// Per-request timeout in seconds
    pub timeout: u64,

    /// Validate server certificates
    pub validate_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry: DEFAULT_RETRY,
            retry_delay: DEFAULT_RETRY_DELAY.as_secs(),
            timeout: DEFAULT_TIMEOUT_SECS,
            validate_certs: true,
        }
    }
}

/// Lookup settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Base directory for relative local sources
    pub work_dir: Option<PathBuf>,

    /// Directories searched for relative local sources
    pub search_paths: Vec<PathBuf>,

    /// Fail when a named field is missing from the matched record
    pub strict_fields: bool,

    /// What to do when a term fails
    pub errors: ErrorBehavior,
}

/// Colors and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colored output
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset and no `-v` is given
    pub level: Option<String>,

    /// Log format: "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Whether the JSON formatter was requested
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// One configuration file as written: only the keys it sets are `Some`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    fetch: FetchLayer,
    lookup: LookupLayer,
    colors: ColorsLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FetchLayer {
    retry: Option<u32>,
    retry_delay: Option<u64>,
    timeout: Option<u64>,
    validate_certs: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LookupLayer {
    work_dir: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    strict_fields: Option<bool>,
    errors: Option<ErrorBehavior>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ColorsLayer {
    enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<String>,
    format: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// An explicitly named file (`--config` or `CONIFER_CONFIG`) must exist;
    /// the discovered locations are skipped when absent.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        match Self::explicit_config_path(config_path) {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                config.apply_layer(Self::read_layer(&path)?);
            }
            None => {
                for path in Self::default_config_paths() {
                    if path.exists() {
                        config.apply_layer(Self::read_layer(&path)?);
                    }
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// The config file the user named, if any
    fn explicit_config_path(explicit_path: Option<&PathBuf>) -> Option<PathBuf> {
        explicit_path
            .cloned()
            .or_else(|| std::env::var_os("CONIFER_CONFIG").map(PathBuf::from))
    }

    /// Locations searched when no config file is named, lowest priority first
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // System-wide config
        paths.push(PathBuf::from("/etc/conifer/conifer.cfg"));

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".conifer.cfg"));
            paths.push(home.join(".conifer/conifer.cfg"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("conifer.cfg"));
        paths.push(PathBuf::from(".conifer.cfg"));

        paths
    }

    /// Parse one config file, choosing the format by extension
    fn read_layer(path: &Path) -> Result<ConfigLayer> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let layer = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => {
                // Try TOML first (for .cfg files), then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(layer)
    }

    /// Overlay a file's settings; keys the file sets win, search paths accumulate
    fn apply_layer(&mut self, layer: ConfigLayer) {
        let ConfigLayer {
            fetch,
            lookup,
            colors,
            logging,
        } = layer;

        if let Some(retry) = fetch.retry {
            self.fetch.retry = retry;
        }
        if let Some(delay) = fetch.retry_delay {
            self.fetch.retry_delay = delay;
        }
        if let Some(timeout) = fetch.timeout {
            self.fetch.timeout = timeout;
        }
        if let Some(validate) = fetch.validate_certs {
            self.fetch.validate_certs = validate;
        }

        if lookup.work_dir.is_some() {
            self.lookup.work_dir = lookup.work_dir;
        }
        self.lookup.search_paths.extend(lookup.search_paths);
        if let Some(strict) = lookup.strict_fields {
            self.lookup.strict_fields = strict;
        }
        if let Some(errors) = lookup.errors {
            self.lookup.errors = errors;
        }

        if let Some(enabled) = colors.enabled {
            self.colors.enabled = enabled;
        }

        if logging.level.is_some() {
            self.logging.level = logging.level;
        }
        if let Some(format) = logging.format {
            self.logging.format = format;
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // CONIFER_RETRY
        if let Ok(retry) = std::env::var("CONIFER_RETRY") {
            if let Ok(n) = retry.parse() {
                self.fetch.retry = n;
            }
        }

        // CONIFER_RETRY_DELAY
        if let Ok(delay) = std::env::var("CONIFER_RETRY_DELAY") {
            if let Ok(n) = delay.parse() {
                self.fetch.retry_delay = n;
            }
        }

        // CONIFER_TIMEOUT
        if let Ok(timeout) = std::env::var("CONIFER_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.fetch.timeout = n;
            }
        }

        // CONIFER_VALIDATE_CERTS
        if let Ok(validate) = std::env::var("CONIFER_VALIDATE_CERTS") {
            if let Some(b) = parse_bool(&validate) {
                self.fetch.validate_certs = b;
            }
        }

        // CONIFER_SEARCH_PATH
        if let Ok(paths) = std::env::var("CONIFER_SEARCH_PATH") {
            self.lookup
                .search_paths
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }

        // CONIFER_STRICT_FIELDS
        if let Ok(strict) = std::env::var("CONIFER_STRICT_FIELDS") {
            if let Some(b) = parse_bool(&strict) {
                self.lookup.strict_fields = b;
            }
        }

        // CONIFER_LOG_LEVEL
        if let Ok(level) = std::env::var("CONIFER_LOG_LEVEL") {
            self.logging.level = Some(level);
        }

        // CONIFER_LOG_FORMAT
        if let Ok(format) = std::env::var("CONIFER_LOG_FORMAT") {
            self.logging.format = format;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() || std::env::var("CONIFER_NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }
    }

    /// Build the lookup context described by this configuration
    pub fn lookup_context(&self) -> LookupContext {
        let mut context = LookupContext::new()
            .with_search_paths(self.lookup.search_paths.clone())
            .with_timeout(self.fetch.timeout)
            .with_validate_certs(self.fetch.validate_certs)
            .with_retry_delay(Duration::from_secs(self.fetch.retry_delay))
            .with_default_retry(self.fetch.retry)
            .with_strict_fields(self.lookup.strict_fields);

        if let Some(dir) = &self.lookup.work_dir {
            context = context.with_work_dir(dir);
        }

        context
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
