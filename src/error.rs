//! Error types for Conifer.
//!
//! Each layer has its own error enum; this module gathers them into the
//! crate-level [`Error`] used by callers that drive more than one engine.

use crate::plugins::filter::JdbcError;
use crate::plugins::lookup::LookupError;
use thiserror::Error;

/// Result type alias for Conifer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Conifer.
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup failed (bad term, missing source, fetch or column fault).
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// JDBC URL could not be translated.
    #[error(transparent)]
    Jdbc(#[from] JdbcError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
