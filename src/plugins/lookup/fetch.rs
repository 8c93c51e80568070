//! Resource Fetcher
//!
//! Retrieves raw text for lookups from either the local filesystem or an
//! HTTP(S) URL.
//!
//! # Source classification
//!
//! - anything starting with `http` is remote
//! - `file://<path>` is local, with the scheme stripped
//! - everything else is a local path, resolved through
//!   [`LookupContext::find_file`]
//!
//! # Remote retry behaviour
//!
//! A remote GET is attempted once plus `retry` more times, pausing
//! [`LookupContext::retry_delay`] between attempts. HTTP error statuses,
//! connection failures, name resolution failures and timeouts are retried.
//! A certificate validation failure is reported at once and never retried.

use super::{LookupContext, LookupError, LookupResult};
use crate::retry::{RetryError, RetryPolicy, TransientError};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Where a lookup's data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Filesystem path, as written (without any `file://` prefix)
    Local(String),
    /// HTTP or HTTPS URL
    Remote(Url),
}

impl Source {
    /// Classify a `src=` value
    pub fn parse(src: &str) -> LookupResult<Self> {
        if src.starts_with("http") {
            let url = Url::parse(src).map_err(|e| {
                LookupError::InvalidTerm(format!("invalid source URL '{}': {}", src, e))
            })?;
            return Ok(Source::Remote(url));
        }

        let path = src.strip_prefix("file://").unwrap_or(src);
        if path.is_empty() {
            return Err(LookupError::InvalidTerm(format!(
                "empty source path in '{}'",
                src
            )));
        }
        Ok(Source::Local(path.to_string()))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local(path) => write!(f, "{}", path),
            Source::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Failure of a single HTTP attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// TCP/TLS connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Host name could not be resolved
    #[error("Failed to resolve host: {0}")]
    Resolve(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server certificate failed validation
    #[error("Certificate validation failed: {0}")]
    Certificate(String),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Any other request failure
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl TransientError for TransportError {
    fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Certificate(_))
    }
}

/// Per-request settings handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Request timeout
    pub timeout: Duration,
    /// Whether to validate the server certificate
    pub validate_certs: bool,
}

impl RequestOptions {
    /// Derive request settings from a lookup context
    pub fn from_context(context: &LookupContext) -> Self {
        Self {
            timeout: Duration::from_secs(context.timeout),
            validate_certs: context.validate_certs,
        }
    }
}

/// A single blocking HTTP GET
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Fetch the body of `url`
    fn get(&self, url: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError>;
}

/// [`HttpTransport`] backed by the blocking `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Create a new ReqwestTransport instance
    pub fn new() -> Self {
        Self
    }

    fn classify(error: reqwest::Error) -> TransportError {
        let detail = error_chain(&error);
        // The top-level message embeds the request URL; match on causes only.
        let causes = cause_chain(&error).to_lowercase();

        if error.is_timeout() {
            TransportError::Timeout(detail)
        } else if is_certificate_failure(&causes) {
            TransportError::Certificate(detail)
        } else if causes.contains("dns error")
            || causes.contains("failed to lookup address")
            || causes.contains("name or service not known")
        {
            TransportError::Resolve(detail)
        } else if error.is_connect() {
            TransportError::Connect(detail)
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(detail)
        } else {
            TransportError::Request(detail)
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!options.validate_certs)
            .timeout(options.timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        let response = client.get(url.clone()).send().map_err(Self::classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().map_err(Self::classify)?;
        Ok(body.to_vec())
    }
}

/// Flatten an error and its sources into one line
fn error_chain(error: &dyn std::error::Error) -> String {
    match error.source() {
        Some(_) => format!("{}: {}", error, cause_chain(error)),
        None => error.to_string(),
    }
}

/// The sources of `error`, without its own message
fn cause_chain(error: &dyn std::error::Error) -> String {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}

/// Whether a lowercased cause chain reports a TLS certificate rejection.
///
/// rustls reports `invalid peer certificate: <reason>`; native TLS stacks
/// report `certificate verify failed`.
fn is_certificate_failure(causes: &str) -> bool {
    const MARKERS: &[&str] = &[
        "invalid peer certificate",
        "certificate verify failed",
        "unknownissuer",
        "invalidcertificate",
    ];
    MARKERS.iter().any(|marker| causes.contains(marker))
}

/// Resolves a `src=` value into text
#[derive(Debug, Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    /// Create a fetcher using the `reqwest` transport
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Create a fetcher with a custom transport
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch `src`, retrying remote sources up to `retry` additional times.
    ///
    /// `retry` is ignored for local sources.
    pub fn fetch(&self, src: &str, retry: u32, context: &LookupContext) -> LookupResult<String> {
        match Source::parse(src)? {
            Source::Local(path) => self.read_local(&path, context),
            Source::Remote(url) => self.fetch_remote(&url, retry, context),
        }
    }

    fn read_local(&self, path: &str, context: &LookupContext) -> LookupResult<String> {
        let resolved = context
            .find_file(path)
            .ok_or_else(|| LookupError::FileNotFound(PathBuf::from(path)))?;

        debug!("Reading local source {}", resolved.display());
        let bytes = fs::read(&resolved)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn fetch_remote(&self, url: &Url, retry: u32, context: &LookupContext) -> LookupResult<String> {
        let policy = RetryPolicy::constant(retry, context.retry_delay);
        let options = RequestOptions::from_context(context);

        let body = policy
            .execute(|attempt| {
                debug!("Connecting to {} (attempt {})", url, attempt);
                self.transport.get(url, &options)
            })
            .map_err(|err| match err {
                RetryError::Aborted {
                    error: TransportError::Certificate(message),
                    ..
                } => LookupError::Certificate {
                    url: url.to_string(),
                    message,
                },
                other => LookupError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: other.attempts(),
                    message: other.into_inner().to_string(),
                },
            })?;

        info!("Fetched {} bytes from {}", body.len(), url);
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
