//! # Conifer - Columnar Lookups and JDBC Translation
//!
//! Conifer answers two kinds of question that come up when rendering
//! configuration for database-backed services:
//!
//! - **Colfile lookups**: find the record for a key in whitespace-delimited
//!   columnar text fetched from a local path or an HTTP(S) URL, and return
//!   the whole record, one column by index, or one field by header name.
//! - **JDBC translation**: turn an Oracle or Postgres JDBC URL into a Perl DBI
//!   data source string, or extract a short database name from it.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 CLI / minijinja template env                  │
//! └───────────────────────────────────────────────────────────────┘
//!                 │                                  │
//!                 ▼                                  ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────┐
//! │   Lookup plugins (colfile)    │   │  Filter plugins (jdbc)    │
//! │  query parsing + Colfile      │   │  jdbc2Dbi, jdbc2shortName │
//! └───────────────────────────────┘   └───────────────────────────┘
//!                 │
//!                 ▼
//! ┌───────────────────────────────┐
//! │  Fetcher (local / HTTP) +     │
//! │  bounded retry policy         │
//! └───────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use conifer::prelude::*;
//!
//! let registry = LookupRegistry::with_builtins();
//! let context = LookupContext::new().with_search_path("/srv/data");
//!
//! let ip = registry.lookup("colfile", &["web01 col=ip src=hosts.txt"], &context)?;
//! let dbi = to_dbi_string("jdbc:postgresql://db.example.com:5432/app")?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};
    // Lookups
    pub use crate::plugins::lookup::{
        Colfile, ColfileLookup, ColfileQuery, ColfileValue, Fetcher, LookupContext, LookupError,
        LookupOptions, LookupPlugin, LookupRegistry, Selector,
    };
    // JDBC translation
    pub use crate::plugins::filter::{to_dbi_string, to_short_name, FilterRegistry, JdbcError};
    // Retry
    pub use crate::retry::{RetryError, RetryPolicy};
}

/// Error types and result aliases for Conifer operations.
pub mod error;

/// Plugin system: lookup plugins and Jinja2-compatible filters.
///
/// - [`lookup`](plugins::lookup): the `colfile` lookup and its fetcher
/// - [`filter`](plugins::filter): the `jdbc2Dbi` and `jdbc2shortName` filters
pub mod plugins;

/// Bounded, blocking retry with a fixed delay between attempts.
pub mod retry;

pub use error::{Error, Result};

/// Returns the current version of Conifer.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
