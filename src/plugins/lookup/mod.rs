//! Lookup Plugin System for Conifer
//!
//! This module provides the lookup plugin infrastructure used to retrieve data
//! from local files and remote URLs. Lookups are invoked with one or more
//! textual terms and return a list of JSON values, the same shape a host
//! template engine receives from `lookup(...)` / `query(...)`.
//!
//! # Architecture
//!
//! 1. **[`LookupPlugin`]** trait: Core trait for all lookup implementations
//! 2. **[`LookupRegistry`]**: Central registry for lookup plugin discovery
//! 3. **[`LookupContext`]**: Execution context passed to lookups (search
//!    paths, network settings, strictness)
//! 4. **[`fetch`]**: Resource fetcher for local paths and HTTP(S) URLs
//! 5. **[`colfile`]**: The columnar-file lookup engine
//!
//! # Example
//!
//! ```rust,ignore
//! use conifer::plugins::lookup::prelude::*;
//!
//! let registry = LookupRegistry::with_builtins();
//! let context = LookupContext::new().with_search_path("inventory");
//!
//! // Whole record as a mapping
//! let row = registry.lookup("colfile", &["web01 src=hosts.txt"], &context)?;
//!
//! // Single column by name
//! let ip = registry.lookup("colfile", &["web01 src=hosts.txt col=address"], &context)?;
//! ```

pub mod colfile;
pub mod fetch;

pub use colfile::{Colfile, ColfileLookup, ColfileQuery, ColfileValue, Selector};
pub use fetch::{Fetcher, HttpTransport, ReqwestTransport, Source, TransportError};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during lookup operations
#[derive(Error, Debug)]
pub enum LookupError {
    /// The requested lookup plugin was not found
    #[error("Lookup plugin not found: {0}")]
    NotFound(String),

    /// Invalid lookup term or argument
    #[error("Invalid lookup term: {0}")]
    InvalidTerm(String),

    /// Missing required option
    #[error("Missing required option: {0}")]
    MissingOption(String),

    /// Invalid option value
    #[error("Invalid option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// Column selector that cannot be interpreted
    #[error("Invalid column selector: {0}")]
    InvalidSelector(String),

    /// Local source not found in any search location
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error during lookup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server certificate could not be validated; never retried
    #[error("Error validating the server's certificate for {url}: {message}")]
    Certificate { url: String, message: String },

    /// Remote source still failing after the final attempt
    #[error("Reached maximum {attempts} url attempts without success for {url}: {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Column index outside the matched record
    #[error("Column index {index} out of range for '{key}' (record has {len} columns)")]
    ColumnIndex {
        key: String,
        index: usize,
        len: usize,
    },

    /// Named field missing from the header or from the matched record
    #[error("Field '{field}' not found for '{key}'")]
    FieldNotFound { key: String, field: String },
}

/// Result type for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;

// ============================================================================
// Lookup Options
// ============================================================================

/// Per-call options for lookup plugins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// What to do with a term that fails
    #[serde(default)]
    pub errors: ErrorBehavior,
}

impl LookupOptions {
    /// Create new empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error behavior
    pub fn with_errors(mut self, behavior: ErrorBehavior) -> Self {
        self.errors = behavior;
        self
    }
}

/// Behavior when lookup encounters an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBehavior {
    /// Raise an error (default)
    #[default]
    Strict,
    /// Skip the failing term silently
    Ignore,
    /// Log warning and skip the failing term
    Warn,
}

impl fmt::Display for ErrorBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBehavior::Strict => write!(f, "strict"),
            ErrorBehavior::Ignore => write!(f, "ignore"),
            ErrorBehavior::Warn => write!(f, "warn"),
        }
    }
}

impl std::str::FromStr for ErrorBehavior {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ErrorBehavior::Strict),
            "ignore" => Ok(ErrorBehavior::Ignore),
            "warn" => Ok(ErrorBehavior::Warn),
            other => Err(LookupError::InvalidOption {
                option: "errors".to_string(),
                message: format!("expected strict, ignore or warn, got '{}'", other),
            }),
        }
    }
}

// ============================================================================
// Lookup Context
// ============================================================================

/// Default number of additional attempts for remote sources
pub const DEFAULT_RETRY: u32 = 1;

/// Default pause between remote attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Default network timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Context for lookup execution
#[derive(Debug, Clone)]
pub struct LookupContext {
    /// Current working directory for file lookups
    pub work_dir: Option<PathBuf>,

    /// Search paths for file lookups; each is also searched under `files/`
    pub search_paths: Vec<PathBuf>,

    /// Timeout for network requests (in seconds)
    pub timeout: u64,

    /// Whether to validate server certificates for HTTPS sources
    pub validate_certs: bool,

    /// Pause between attempts on remote sources
    pub retry_delay: Duration,

    /// Additional attempts when a term has no `retry=` parameter
    pub default_retry: u32,

    /// Fail instead of returning an empty result when a named field is missing
    pub strict_fields: bool,
}

impl Default for LookupContext {
    fn default() -> Self {
        Self {
            work_dir: None,
            search_paths: Vec::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            validate_certs: true,
            retry_delay: DEFAULT_RETRY_DELAY,
            default_retry: DEFAULT_RETRY,
            strict_fields: false,
        }
    }
}

impl LookupContext {
    /// Create a new context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set working directory
    pub fn with_work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(path.into());
        self
    }

    /// Add search path
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Set search paths
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set certificate validation
    pub fn with_validate_certs(mut self, validate: bool) -> Self {
        self.validate_certs = validate;
        self
    }

    /// Set the pause between remote attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the default number of additional remote attempts
    pub fn with_default_retry(mut self, retry: u32) -> Self {
        self.default_retry = retry;
        self
    }

    /// Set strict field handling
    pub fn with_strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    /// Get effective working directory
    pub fn effective_work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Locate a local source file.
    ///
    /// Absolute paths are used as-is. Relative paths are tried against the
    /// working directory, then against each search path's `files/`
    /// subdirectory and the search path itself.
    pub fn find_file(&self, path: &str) -> Option<PathBuf> {
        let path = PathBuf::from(path);

        if path.is_absolute() {
            return path.is_file().then_some(path);
        }

        let full_path = self.effective_work_dir().join(&path);
        if full_path.is_file() {
            return Some(full_path);
        }

        for search_path in &self.search_paths {
            for candidate in [search_path.join("files").join(&path), search_path.join(&path)] {
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

// ============================================================================
// Lookup Plugin Trait
// ============================================================================

/// Trait that all lookup plugins must implement
pub trait LookupPlugin: Send + Sync + fmt::Debug {
    /// Returns the name of the lookup plugin
    fn name(&self) -> &'static str;

    /// Returns a description of what the lookup does
    fn description(&self) -> &'static str;

    /// Execute the lookup with the given terms and options
    ///
    /// # Arguments
    ///
    /// * `terms` - The lookup terms/arguments
    /// * `options` - Options passed to the lookup
    /// * `context` - Execution context with search paths and network settings
    ///
    /// # Returns
    ///
    /// A vector of JSON values, concatenated across terms
    fn lookup(
        &self,
        terms: &[String],
        options: &LookupOptions,
        context: &LookupContext,
    ) -> LookupResult<Vec<serde_json::Value>>;

    /// Validate options before execution
    fn validate_options(&self, _options: &LookupOptions) -> LookupResult<()> {
        Ok(())
    }

    /// Returns example usage for documentation
    fn examples(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Returns a list of available options with descriptions
    fn available_options(&self) -> Vec<LookupOptionInfo> {
        vec![]
    }
}

/// Information about a lookup option
#[derive(Debug, Clone)]
pub struct LookupOptionInfo {
    /// Option name
    pub name: &'static str,
    /// Option description
    pub description: &'static str,
    /// Option type
    pub option_type: &'static str,
    /// Default value as string
    pub default: Option<&'static str>,
    /// Whether the option is required
    pub required: bool,
}

impl LookupOptionInfo {
    /// Create a new option info
    pub fn new(name: &'static str, description: &'static str, option_type: &'static str) -> Self {
        Self {
            name,
            description,
            option_type,
            default: None,
            required: false,
        }
    }

    /// Set default value
    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

// ============================================================================
// Lookup Registry
// ============================================================================

/// Registry for managing lookup plugins
#[derive(Debug, Default)]
pub struct LookupRegistry {
    plugins: HashMap<String, Arc<dyn LookupPlugin>>,
}

impl LookupRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in lookup plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ColfileLookup::new());
        registry
    }

    /// Register a lookup plugin
    pub fn register<P: LookupPlugin + 'static>(&mut self, plugin: P) {
        let name = plugin.name().to_string();
        self.plugins.insert(name, Arc::new(plugin));
    }

    /// Get a lookup plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn LookupPlugin>> {
        self.plugins.get(name).cloned()
    }

    /// Check if a lookup plugin exists
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// List all registered plugin names
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a lookup by plugin name
    pub fn lookup(
        &self,
        name: &str,
        terms: &[&str],
        context: &LookupContext,
    ) -> LookupResult<Vec<serde_json::Value>> {
        self.lookup_with_options(name, terms, &LookupOptions::default(), context)
    }

    /// Execute a lookup with options
    pub fn lookup_with_options(
        &self,
        name: &str,
        terms: &[&str],
        options: &LookupOptions,
        context: &LookupContext,
    ) -> LookupResult<Vec<serde_json::Value>> {
        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| LookupError::NotFound(name.to_string()))?;

        plugin.validate_options(options)?;
        let terms: Vec<String> = terms.iter().map(|s| s.to_string()).collect();
        plugin.lookup(&terms, options, context)
    }
}

// ============================================================================
// Template Functions
// ============================================================================

/// Register `lookup(name, *terms)` and `query(name, *terms)` with a template
/// environment.
///
/// `lookup` unwraps a single-element result; `query` always yields a list.
pub fn register_lookup_functions(
    env: &mut minijinja::Environment<'static>,
    registry: Arc<LookupRegistry>,
    context: Arc<LookupContext>,
) {
    use minijinja::value::{Rest, Value};

    let lookup_registry = Arc::clone(&registry);
    let lookup_context = Arc::clone(&context);
    env.add_function(
        "lookup",
        move |name: String, terms: Rest<String>| -> Result<Value, minijinja::Error> {
            let mut values = run_template_lookup(&lookup_registry, &lookup_context, &name, &terms)?;
            if values.len() == 1 {
                Ok(Value::from_serialize(values.remove(0)))
            } else {
                Ok(Value::from_serialize(values))
            }
        },
    );

    env.add_function(
        "query",
        move |name: String, terms: Rest<String>| -> Result<Value, minijinja::Error> {
            let values = run_template_lookup(&registry, &context, &name, &terms)?;
            Ok(Value::from_serialize(values))
        },
    );
}

fn run_template_lookup(
    registry: &LookupRegistry,
    context: &LookupContext,
    name: &str,
    terms: &[String],
) -> Result<Vec<serde_json::Value>, minijinja::Error> {
    let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
    registry.lookup(name, &terms, context).map_err(|e| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("{} lookup: {}", name, e),
        )
    })
}

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient re-exports for lookup development and usage.
pub mod prelude {
    pub use super::{
        register_lookup_functions, ColfileLookup, ErrorBehavior, LookupContext, LookupError,
        LookupOptionInfo, LookupOptions, LookupPlugin, LookupRegistry, LookupResult,
    };
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_options_errors() {
        assert_eq!(LookupOptions::new().errors, ErrorBehavior::Strict);
        assert_eq!(
            LookupOptions::new().with_errors(ErrorBehavior::Ignore).errors,
            ErrorBehavior::Ignore
        );

        let parsed: LookupOptions = serde_json::from_str(r#"{"errors": "warn"}"#).unwrap();
        assert_eq!(parsed, LookupOptions::new().with_errors(ErrorBehavior::Warn));
    }

    #[test]
    fn test_error_behavior_parse_and_display() {
        assert_eq!("strict".parse::<ErrorBehavior>().unwrap(), ErrorBehavior::Strict);
        assert_eq!("IGNORE".parse::<ErrorBehavior>().unwrap(), ErrorBehavior::Ignore);
        assert_eq!(ErrorBehavior::Warn.to_string(), "warn");
        assert!(matches!(
            "loud".parse::<ErrorBehavior>(),
            Err(LookupError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_lookup_context_defaults() {
        let ctx = LookupContext::new();
        assert!(ctx.work_dir.is_none());
        assert!(ctx.search_paths.is_empty());
        assert!(ctx.validate_certs);
        assert_eq!(ctx.default_retry, 1);
        assert_eq!(ctx.retry_delay, Duration::from_secs(3));
        assert_eq!(ctx.timeout, 30);
        assert!(!ctx.strict_fields);
    }

    #[test]
    fn test_find_file_in_files_subdirectory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("files")).unwrap();
        fs::write(dir.path().join("files").join("hosts.txt"), "a b\n").unwrap();

        let ctx = LookupContext::new()
            .with_work_dir(dir.path().join("elsewhere"))
            .with_search_path(dir.path());

        assert_eq!(
            ctx.find_file("hosts.txt"),
            Some(dir.path().join("files").join("hosts.txt"))
        );
    }

    #[test]
    fn test_find_file_prefers_work_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.txt"), "x").unwrap();

        let ctx = LookupContext::new().with_work_dir(dir.path());
        assert_eq!(ctx.find_file("data.txt"), Some(dir.path().join("data.txt")));
        assert!(ctx.find_file("nonexistent_file_12345.txt").is_none());
    }

    #[test]
    fn test_find_file_absolute() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abs.txt");
        fs::write(&path, "x").unwrap();

        let ctx = LookupContext::new();
        assert_eq!(ctx.find_file(path.to_str().unwrap()), Some(path.clone()));
        assert!(ctx.find_file(dir.path().join("nope").to_str().unwrap()).is_none());
    }

    #[test]
    fn test_lookup_option_info() {
        let info = LookupOptionInfo::new("src", "Source path or URL", "string").required();
        assert_eq!(info.name, "src");
        assert!(info.required);
        assert!(info.default.is_none());

        let info = LookupOptionInfo::new("retry", "Extra attempts", "int").with_default("1");
        assert_eq!(info.default, Some("1"));
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = LookupRegistry::with_builtins();
        assert!(registry.contains("colfile"));
        assert_eq!(registry.list(), vec!["colfile"]);
    }

    #[test]
    fn test_registry_not_found() {
        let registry = LookupRegistry::new();
        let context = LookupContext::default();

        let result = registry.lookup("nonexistent", &[], &context);
        assert!(matches!(result, Err(LookupError::NotFound(_))));
    }

    #[test]
    fn test_template_functions() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("hosts.txt"),
            "name  ip         role\nweb01 10.0.0.1   web\ndb01  10.0.0.2   db\n",
        )
        .unwrap();

        let mut env = minijinja::Environment::new();
        register_lookup_functions(
            &mut env,
            Arc::new(LookupRegistry::with_builtins()),
            Arc::new(LookupContext::new().with_work_dir(dir.path())),
        );

        let rendered = env
            .render_str("{{ lookup('colfile', 'db01 src=hosts.txt col=ip') }}", minijinja::context! {})
            .unwrap();
        assert_eq!(rendered, "10.0.0.2");

        let rendered = env
            .render_str("{{ lookup('colfile', 'web01 src=hosts.txt').role }}", minijinja::context! {})
            .unwrap();
        assert_eq!(rendered, "web");

        let rendered = env
            .render_str("{{ query('colfile', 'nobody src=hosts.txt col=1') | length }}", minijinja::context! {})
            .unwrap();
        assert_eq!(rendered, "0");
    }

    #[test]
    fn test_template_function_error() {
        let mut env = minijinja::Environment::new();
        register_lookup_functions(
            &mut env,
            Arc::new(LookupRegistry::with_builtins()),
            Arc::new(LookupContext::new()),
        );

        let err = env
            .render_str("{{ lookup('nope', 'x') }}", minijinja::context! {})
            .unwrap_err();
        assert!(err.to_string().contains("Lookup plugin not found: nope"));
    }
}
