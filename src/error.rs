//! Error types for catalog generation.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single filename could not be split into catalog fields.
///
/// These are per-file: the build reports them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("`{name}` does not start with `{case}.`")]
    MissingCasePrefix { name: String, case: String },

    #[error("`{0}` has no file extension")]
    MissingExtension(String),

    #[error("`{0}` has no date-range token (expected `<start>-<end>`)")]
    NoDateRange(String),

    #[error("`{name}` has {count} tokens that look like a date range")]
    AmbiguousDateRange { name: String, count: usize },

    #[error("`{name}`: date range `{token}` is not `<start>-<end>`")]
    MalformedDateRange { name: String, token: String },

    #[error("`{0}` has no variable token before its date range")]
    MissingVariable(String),

    #[error("`{0}` has no stream tokens before its variable")]
    MissingStream(String),
}

/// Failure to read a variable's `long_name` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LongNameError {
    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("{path} has no variable `{variable}`")]
    MissingVariable { path: PathBuf, variable: String },

    #[error("variable `{variable}` in {path} has no `long_name` attribute")]
    MissingAttribute { path: PathBuf, variable: String },

    #[error("`long_name` of `{variable}` in {path} is not text")]
    NotText { path: PathBuf, variable: String },

    #[error("netCDF support was not compiled in")]
    Unsupported,
}

/// Fatal problems discovering the case context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("case root {0} does not exist")]
    CaseRootMissing(PathBuf),

    #[error("can not find xmlquery in {0}")]
    XmlQueryMissing(PathBuf),

    #[error("`{command}` failed in {dir}: {reason}")]
    Query { command: String, dir: PathBuf, reason: String },

    #[error("case variable {0} is not set")]
    MissingValue(&'static str),

    #[error("can not find any data for {0}")]
    NoDataRoot(String),

    #[error("failed to read case context from {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: FixtureError,
    },
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// A catalog run that could not produce its output file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode catalog row: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
