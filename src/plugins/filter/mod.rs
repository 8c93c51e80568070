//! Jinja2-compatible filter plugins for Conifer.
//!
//! Filters are organized into categories:
//!
//! - **jdbc**: JDBC URL translation (`jdbc2Dbi`, `jdbc2shortName`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use conifer::plugins::filter::FilterRegistry;
//! use minijinja::Environment;
//!
//! let mut env = Environment::new();
//! FilterRegistry::register_all(&mut env);
//! ```

pub mod jdbc;

pub use jdbc::{to_dbi_string, to_short_name, JdbcError, JdbcResult, Target};

use minijinja::Environment;

/// Registry for managing and registering filter plugins.
///
/// This struct provides methods to register all available filters
/// with a minijinja Environment.
pub struct FilterRegistry;

impl FilterRegistry {
    /// Register all available filters with the given environment.
    pub fn register_all(env: &mut Environment<'static>) {
        jdbc::register_filters(env);
    }

    /// Register only JDBC filters.
    pub fn register_jdbc(env: &mut Environment<'static>) {
        jdbc::register_filters(env);
    }
}
