//! Plugin System for Conifer
//!
//! Conifer's engines are exposed as plugins that can be used directly or
//! registered with a minijinja template environment.
//!
//! # Plugin Categories
//!
//! ## Filter Plugins
//!
//! Jinja2-compatible filters. The JDBC translator lives here as the
//! `jdbc2Dbi` and `jdbc2shortName` filters.
//!
//! See the [`filter`] module for available filters.
//!
//! ## Lookup Plugins
//!
//! Plugins for retrieving data from local files or HTTP(S) sources. The
//! columnar `colfile` lookup lives here.
//!
//! See the [`lookup`] module for available lookups.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use conifer::plugins::filter::FilterRegistry;
//! use conifer::plugins::lookup::prelude::*;
//! use minijinja::Environment;
//! use std::sync::Arc;
//!
//! let mut env = Environment::new();
//! FilterRegistry::register_all(&mut env);
//! register_lookup_functions(
//!     &mut env,
//!     Arc::new(LookupRegistry::with_builtins()),
//!     Arc::new(LookupContext::default()),
//! );
//!
//! let out = env.render_str(
//!     "{{ lookup('colfile', 'web01 col=ip src=hosts.txt') }}",
//!     minijinja::context! {},
//! )?;
//! ```
//!
//! # Creating Custom Lookups
//!
//! Implement the [`lookup::LookupPlugin`] trait:
//!
//! ```rust,ignore
//! use conifer::plugins::lookup::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct MyLookup;
//!
//! impl LookupPlugin for MyLookup {
//!     fn name(&self) -> &'static str { "my_lookup" }
//!     fn description(&self) -> &'static str { "My custom lookup" }
//!     fn lookup(
//!         &self,
//!         terms: &[String],
//!         options: &LookupOptions,
//!         context: &LookupContext,
//!     ) -> LookupResult<Vec<serde_json::Value>> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod filter;
pub mod lookup;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::filter::FilterRegistry;
    pub use super::lookup::prelude::*;
}
