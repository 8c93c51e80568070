//! JDBC connection string filters for Jinja2 templates.
//!
//! Translates JDBC URLs for Oracle and Postgres into Perl DBI data source
//! strings, and derives a short database name from the same URLs.
//!
//! # Available Filters
//!
//! - `jdbc2Dbi`: JDBC URL to DBI data source string
//! - `jdbc2shortName`: JDBC URL to short service or database name
//!
//! # Examples
//!
//! ```jinja2
//! {{ 'jdbc:oracle:thin:@db.example.com:1521:orcl' | jdbc2Dbi }}
//! {# dbi:Oracle:host=db.example.com;sid=orcl;port=1521 #}
//!
//! {{ 'jdbc:oracle:thin:@db.example.com/orcl.example.com' | jdbc2shortName }}
//! {# orcl #}
//! ```
//!
//! # Recognized dialects
//!
//! | Form | DBI | Short name |
//! |------|-----|------------|
//! | `jdbc:oracle:thin:@host:port:sid` | `dbi:Oracle:host=H;sid=S;port=P` | `S` |
//! | `jdbc:oracle:thin:@(DESCRIPTION=...)` | `dbi:Oracle:(DESCRIPTION=...)` | `SERVICE_NAME` up to the first `.` |
//! | `jdbc:oracle:oci:@service` | `dbi:Oracle:service` | `service` |
//! | `jdbc:oracle:thin:@host/service` | `dbi:Oracle:host/service` | `service` up to the first `.` |
//! | `jdbc:postgresql://host:port/db` | `dbi:Pg:dbname=D;host=H;port=P` | `D` |
//! | `jdbc:postgresql://host/db` | `dbi:Pg:dbname=D;host=H` | `D` |
//! | `jdbc:postgresql://db` | `dbi:Pg:dbname=D` | `D` |
//!
//! All markers match case-insensitively. Rules are tried in table order and
//! the first match wins.

use minijinja::{Environment, ErrorKind};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::trace;

/// Register all JDBC filters with the given environment.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("jdbc2Dbi", jdbc2_dbi);
    env.add_filter("jdbc2shortName", jdbc2_short_name);
}

/// What a translation was attempting when it gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A DBI data source string
    Dbi,
    /// A short database name
    ShortName,
}

/// Errors from JDBC translation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JdbcError {
    #[error("{}", unrecognized_message(.url, .target))]
    UnrecognizedDialect { url: String, target: Target },
}

fn unrecognized_message(url: &str, target: &Target) -> String {
    match target {
        Target::Dbi => format!("Unable to convert jdbc string '{}' to dbi.", url),
        Target::ShortName => format!("Unable to determine short name for jdbc string '{}'.", url),
    }
}

/// Result type for JDBC translation
pub type JdbcResult<T> = std::result::Result<T, JdbcError>;

/// One recognizer: `predicate` decides whether the rule applies, `extractor`
/// supplies the captures that `render` turns into output.
struct DialectRule {
    name: &'static str,
    predicate: Regex,
    extractor: Regex,
    render: fn(&Captures<'_>) -> String,
}

impl DialectRule {
    fn new(name: &'static str, pattern: &str, render: fn(&Captures<'_>) -> String) -> Self {
        let extractor = anchored(pattern);
        Self {
            name,
            predicate: extractor.clone(),
            extractor,
            render,
        }
    }

    fn with_predicate(mut self, pattern: &str) -> Self {
        self.predicate = anchored(pattern);
        self
    }

    fn apply(&self, url: &str) -> Option<String> {
        if !self.predicate.is_match(url) {
            return None;
        }
        let caps = self.extractor.captures(url)?;
        trace!("jdbc url '{}' matched rule '{}'", url, self.name);
        Some((self.render)(&caps))
    }
}

/// Case-insensitive, anchored at the start of the input only
fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("(?i)^(?:{})", pattern)).expect("Invalid JDBC dialect regex")
}

fn group<'a>(caps: &'a Captures<'_>, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Portion of a dotted service name before the first `.`
fn first_segment(name: &str) -> String {
    name.split('.').next().unwrap_or(name).to_string()
}

static ORACLE_MARKER: Lazy<Regex> = Lazy::new(|| anchored(r".+:oracle:"));
static POSTGRES_MARKER: Lazy<Regex> = Lazy::new(|| anchored(r".+:postgresql:"));

static ORACLE_DBI_RULES: Lazy<Vec<DialectRule>> = Lazy::new(|| {
    vec![
        DialectRule::new("oracle-thin-sid", r".+thin:[^@]*@([^:]+):([^:]+):([^:]+)", |c| {
            format!(
                "dbi:Oracle:host={};sid={};port={}",
                group(c, 1),
                group(c, 3),
                group(c, 2)
            )
        }),
        DialectRule::new("oracle-thin-descriptor", r"[^@]+@(.+)", |c| {
            format!("dbi:Oracle:{}", group(c, 1))
        })
        .with_predicate(r".+@\(DESCRIPTION"),
        DialectRule::new("oracle-oci", r".+:oci:@(.+)", |c| {
            format!("dbi:Oracle:{}", group(c, 1))
        }),
        DialectRule::new("oracle-thin", r".+thin:[^@]*@(.+)", |c| {
            format!("dbi:Oracle:{}", group(c, 1))
        }),
    ]
});

static POSTGRES_DBI_RULES: Lazy<Vec<DialectRule>> = Lazy::new(|| {
    vec![
        DialectRule::new(
            "postgres-host-port-db",
            r".+postgresql://([^:/]+):([0-9]+)/(.+)",
            |c| {
                format!(
                    "dbi:Pg:dbname={};host={};port={}",
                    group(c, 3),
                    group(c, 1),
                    group(c, 2)
                )
            },
        ),
        DialectRule::new("postgres-host-db", r".+postgresql://([^/]+)/(.+)", |c| {
            format!("dbi:Pg:dbname={};host={}", group(c, 2), group(c, 1))
        }),
        DialectRule::new("postgres-db", r".+postgresql://(.+)", |c| {
            format!("dbi:Pg:dbname={}", group(c, 1))
        }),
    ]
});

static SHORT_NAME_RULES: Lazy<Vec<DialectRule>> = Lazy::new(|| {
    vec![
        DialectRule::new("oracle-oci", r"jdbc:oracle:oci:@(.+)", |c| {
            group(c, 1).to_string()
        }),
        DialectRule::new("oracle-thin-sid", r"jdbc:oracle:thin:@[^:]+:[^:]+:(.+)", |c| {
            group(c, 1).to_string()
        }),
        DialectRule::new(
            "oracle-thin-descriptor",
            r"jdbc:oracle:thin:@.+SERVICE_NAME\s*=\s*([^)\s]+)",
            |c| first_segment(group(c, 1)),
        ),
        DialectRule::new("oracle-thin-service", r"jdbc:oracle:thin:@[^/]+/(.+)", |c| {
            first_segment(group(c, 1))
        }),
        DialectRule::new("postgres-path-tail", r"jdbc:postgresql://(?:[^/]+/)*(.+)", |c| {
            group(c, 1).to_string()
        }),
    ]
});

fn first_match(rules: &[DialectRule], url: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(url))
}

/// Translate a JDBC URL into a DBI data source string.
///
/// The vendor marker (`:oracle:` or `:postgresql:`) selects a rule family;
/// within it the first matching rule wins.
pub fn to_dbi_string(url: &str) -> JdbcResult<String> {
    let rules: &[DialectRule] = if ORACLE_MARKER.is_match(url) {
        &ORACLE_DBI_RULES
    } else if POSTGRES_MARKER.is_match(url) {
        &POSTGRES_DBI_RULES
    } else {
        &[]
    };

    first_match(rules, url).ok_or_else(|| JdbcError::UnrecognizedDialect {
        url: url.to_string(),
        target: Target::Dbi,
    })
}

/// Extract a short service or database name from a JDBC URL.
pub fn to_short_name(url: &str) -> JdbcResult<String> {
    first_match(&SHORT_NAME_RULES, url).ok_or_else(|| JdbcError::UnrecognizedDialect {
        url: url.to_string(),
        target: Target::ShortName,
    })
}

fn into_template_error(e: JdbcError) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())
}

/// Template filter wrapping [`to_dbi_string`]
fn jdbc2_dbi(url: String) -> Result<String, minijinja::Error> {
    to_dbi_string(&url).map_err(into_template_error)
}

/// Template filter wrapping [`to_short_name`]
fn jdbc2_short_name(url: String) -> Result<String, minijinja::Error> {
    to_short_name(&url).map_err(into_template_error)
}
