//! Colfile Lookup Plugin
//!
//! Looks up values in whitespace-delimited columnar text fetched from a local
//! file or an HTTP(S) URL.
//!
//! # Usage
//!
//! ```yaml
//! # Whole record as a mapping of header field -> value
//! host: "{{ lookup('colfile', 'web01 src=hosts.txt') }}"
//!
//! # Single value by zero-based column index
//! ip: "{{ lookup('colfile', 'web01 col=1 src=https://example.com/hosts.txt') }}"
//!
//! # Single value by header field name, with two extra attempts
//! role: "{{ lookup('colfile', 'web01 col=role src=https://example.com/hosts.txt retry=2') }}"
//! ```
//!
//! # Data format
//!
//! ```text
//! # comment lines start with '#', blank lines are ignored
//! name    ip          role
//! web01   10.0.0.1    web
//! db01    10.0.0.2    db
//! ```
//!
//! The first non-comment, non-blank line is the header. The first record whose
//! first token equals the key is the match; later duplicates are never seen.
//!
//! # Term parameters
//!
//! - `src` (string, required): local path, `file://` path, or `http(s)://` URL
//! - `col` (int or string): column index or header field name; omit for the whole record
//! - `retry` (int): additional attempts for remote sources (default: 1)

use super::{
    ErrorBehavior, Fetcher, LookupContext, LookupError, LookupOptionInfo, LookupOptions,
    LookupPlugin, LookupResult,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Which part of the matching record to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Whole record as a header-field mapping
    Row,
    /// Zero-based token position; the header is not consumed
    Index(usize),
    /// Value of the named header field
    Field(String),
}

impl Selector {
    /// Interpret a `col=` value.
    ///
    /// Absent or empty selects the row; an integer selects an index; anything
    /// else names a field.
    pub fn parse(col: Option<&str>) -> LookupResult<Self> {
        let col = match col {
            None | Some("") => return Ok(Selector::Row),
            Some(col) => col,
        };

        let digits = col.strip_prefix(['-', '+']).unwrap_or(col);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Selector::Field(col.to_string()));
        }

        if col.starts_with('-') && digits.bytes().any(|b| b != b'0') {
            return Err(LookupError::InvalidSelector(format!(
                "column index must be zero or positive, got '{}'",
                col
            )));
        }

        digits.parse::<usize>().map(Selector::Index).map_err(|_| {
            LookupError::InvalidSelector(format!("column index '{}' is too large", col))
        })
    }
}

/// One element of a lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColfileValue {
    /// Header field -> value mapping, in header order
    Record(IndexMap<String, String>),
    /// A single column value
    Scalar(String),
}

impl From<ColfileValue> for serde_json::Value {
    fn from(value: ColfileValue) -> Self {
        match value {
            ColfileValue::Record(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect(),
            ),
            ColfileValue::Scalar(s) => serde_json::Value::String(s),
        }
    }
}

/// Lines that take part in parsing: no `#` comments, no blank lines
fn content_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split(['\n', '\r'])
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
}

/// The columnar lookup engine.
///
/// Stateless apart from its strictness flag; data is parsed fresh on every
/// call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Colfile {
    strict_fields: bool,
}

impl Colfile {
    /// Create an engine that returns empty results for missing fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`LookupError::FieldNotFound`] instead of returning an empty
    /// result when the matched record has no value for the named field
    pub fn with_strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    /// Answer a lookup over `data`.
    ///
    /// - [`Selector::Row`] always yields one element: the matched record, or
    ///   an empty mapping when nothing matches.
    /// - [`Selector::Index`] and [`Selector::Field`] yield one scalar, or
    ///   nothing when no record matches.
    pub fn lookup(&self, key: &str, selector: &Selector, data: &str) -> LookupResult<Vec<ColfileValue>> {
        match selector {
            Selector::Row => Ok(vec![ColfileValue::Record(self.by_row(key, data))]),
            Selector::Index(index) => self.by_index(key, *index, data),
            Selector::Field(field) => self.by_field(key, field, data),
        }
    }

    fn by_row(&self, key: &str, data: &str) -> IndexMap<String, String> {
        let mut lines = content_lines(data);
        let Some(header) = lines.next() else {
            return IndexMap::new();
        };
        let fields: Vec<&str> = header.split_whitespace().collect();

        let matched = find_record(key, lines)
            .map(|values| {
                fields
                    .iter()
                    .zip(values.iter())
                    .map(|(field, value)| (field.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        debug!("colfile match is {:?}", matched);
        matched
    }

    fn by_index(&self, key: &str, index: usize, data: &str) -> LookupResult<Vec<ColfileValue>> {
        let Some(values) = find_record(key, content_lines(data)) else {
            return Ok(Vec::new());
        };

        debug!("colfile found '{}', getting col {}", key, index);
        let value = values.get(index).ok_or_else(|| LookupError::ColumnIndex {
            key: key.to_string(),
            index,
            len: values.len(),
        })?;

        Ok(vec![ColfileValue::Scalar(value.to_string())])
    }

    fn by_field(&self, key: &str, field: &str, data: &str) -> LookupResult<Vec<ColfileValue>> {
        let mut lines = content_lines(data);
        let Some(header) = lines.next() else {
            return Ok(Vec::new());
        };
        let fields: Vec<&str> = header.split_whitespace().collect();

        let Some(values) = find_record(key, lines) else {
            return Ok(Vec::new());
        };

        debug!("colfile found '{}', getting field '{}'", key, field);
        // A repeated header name maps to its last position.
        let value = fields
            .iter()
            .rposition(|f| *f == field)
            .and_then(|position| values.get(position));

        match value {
            Some(value) => Ok(vec![ColfileValue::Scalar(value.to_string())]),
            None if self.strict_fields => Err(LookupError::FieldNotFound {
                key: key.to_string(),
                field: field.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// First record whose first token is `key`
fn find_record<'a>(key: &str, lines: impl Iterator<Item = &'a str>) -> Option<Vec<&'a str>> {
    lines
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|values| {
            debug!("colfile looking for '{}' in {:?}", key, values);
            values.first() == Some(&key)
        })
}

/// A parsed `<key> [src=] [col=] [retry=]` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColfileQuery {
    /// Exact-match value for the first column
    pub key: String,
    /// Local path or URL
    pub src: String,
    /// Which part of the record to return
    pub selector: Selector,
    /// Additional attempts for remote sources
    pub retry: u32,
}

impl ColfileQuery {
    /// Parse a lookup term, using `default_retry` when no `retry=` is given
    pub fn parse(term: &str, default_retry: u32) -> LookupResult<Self> {
        let mut params = term.split_whitespace();
        let key = params
            .next()
            .ok_or_else(|| LookupError::InvalidTerm("colfile term is empty".to_string()))?;

        let mut src = None;
        let mut col = None;
        let mut retry = default_retry;

        for param in params {
            let mut parts = param.split('=');
            let (name, value) = match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(value), None) => (name, value),
                _ => {
                    return Err(LookupError::InvalidTerm(format!(
                        "expected name=value, got '{}' in '{}'",
                        param, term
                    )))
                }
            };

            match name {
                "src" => src = Some(value),
                "col" => col = Some(value),
                "retry" => {
                    retry = value.parse().map_err(|_| LookupError::InvalidOption {
                        option: "retry".to_string(),
                        message: format!("expected a non-negative integer, got '{}' in '{}'", value, term),
                    })?
                }
                other => {
                    return Err(LookupError::InvalidTerm(format!(
                        "unknown parameter '{}' in '{}'",
                        other, term
                    )))
                }
            }
        }

        let src = src
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LookupError::MissingOption(format!("src (in '{}')", term)))?;

        Ok(Self {
            key: key.to_string(),
            src: src.to_string(),
            selector: Selector::parse(col)?,
            retry,
        })
    }
}

/// Colfile lookup plugin
#[derive(Debug, Clone, Default)]
pub struct ColfileLookup {
    fetcher: Fetcher,
}

impl ColfileLookup {
    /// Create a new ColfileLookup instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific fetcher (e.g. with a custom HTTP transport)
    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Run a single term end to end
    pub fn lookup_term(&self, term: &str, context: &LookupContext) -> LookupResult<Vec<ColfileValue>> {
        let query = ColfileQuery::parse(term, context.default_retry)?;
        debug!(
            "colfile lookup key='{}' src='{}' selector={:?} retry={}",
            query.key, query.src, query.selector, query.retry
        );

        let data = self.fetcher.fetch(&query.src, query.retry, context)?;

        Colfile::new()
            .with_strict_fields(context.strict_fields)
            .lookup(&query.key, &query.selector, &data)
    }
}

impl LookupPlugin for ColfileLookup {
    fn name(&self) -> &'static str {
        "colfile"
    }

    fn description(&self) -> &'static str {
        "Looks up values in whitespace-delimited columnar files from a path or URL"
    }

    fn lookup(
        &self,
        terms: &[String],
        options: &LookupOptions,
        context: &LookupContext,
    ) -> LookupResult<Vec<serde_json::Value>> {
        let mut results = Vec::new();

        for term in terms {
            match self.lookup_term(term, context) {
                Ok(values) => results.extend(values.into_iter().map(serde_json::Value::from)),
                Err(e) => match options.errors {
                    ErrorBehavior::Strict => return Err(e),
                    ErrorBehavior::Warn => warn!("colfile lookup of '{}' failed: {}", term, e),
                    ErrorBehavior::Ignore => {}
                },
            }
        }

        Ok(results)
    }

    fn examples(&self) -> Vec<&'static str> {
        vec![
            "lookup('colfile', 'web01 src=hosts.txt')",
            "lookup('colfile', 'web01 col=1 src=https://example.com/hosts.txt')",
            "lookup('colfile', 'web01 col=role src=https://example.com/hosts.txt retry=2')",
        ]
    }

    fn available_options(&self) -> Vec<LookupOptionInfo> {
        vec![
            LookupOptionInfo::new("src", "Local path, file:// path or http(s) URL", "string")
                .required(),
            LookupOptionInfo::new("col", "Column index or header field name", "int|string"),
            LookupOptionInfo::new("retry", "Additional attempts for remote sources", "int")
                .with_default("1"),
        ]
    }
}
