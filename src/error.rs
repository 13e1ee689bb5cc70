//! Error types for query building.
//!
//! Two severities exist:
//!
//! - [`ErrorRecord`] - a recoverable, path-qualified failure. Records are
//!   appended to the accumulator and the build keeps going.
//! - [`BuildError`] - a fatal failure. Returned from the consuming builder
//!   methods; the partial build is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type for operations that can abort a build.
pub type BuildResult<T> = Result<T, BuildError>;

/// The accumulator stage that produced an error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Select,
    Group,
    Sort,
    Aggregate,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Select => "select",
            ErrorKind::Group => "group",
            ErrorKind::Sort => "sort",
            ErrorKind::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable failure recorded during a build.
///
/// `path` runs from the root entity to the failing segment. `load_path` is
/// the caller-supplied context chain, copied verbatim (root first) into
/// every record of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub path: Vec<String>,
    pub load_path: Vec<String>,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(
        kind: ErrorKind,
        path: Vec<String>,
        load_path: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path,
            load_path,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error at [{}]", self.kind, self.path.join(", "))?;
        if !self.load_path.is_empty() {
            write!(f, " (loading {})", self.load_path.join(" -> "))?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Fatal build errors.
///
/// Only unknown capabilities are fatal: a derived-expression identifier the
/// function library does not know, or an aggregate symbol outside the
/// supported set. Everything else is recorded as an [`ErrorRecord`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("Unsupported function '{identifier}' applied to '{field}'")]
    UnsupportedFunction { identifier: String, field: String },

    #[error("Unsupported fragment \"{fragment}\" applied to '{field}'")]
    UnsupportedFragment { fragment: String, field: String },

    #[error("Unsupported aggregate function '{symbol}'")]
    UnsupportedAggregate { symbol: String },

    #[error("Unknown root entity: '{0}'")]
    UnknownEntity(String),
}
