//! Per-cell and per-field diagnostics.

use crate::Error;
use serde::Serialize;
use std::fmt;

/// Severity of a sync issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Noted; the rest of the row is unaffected.
    Warning,
    /// The cell or field was not written.
    Error,
}

/// A non-fatal problem found while mapping one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIssue {
    /// Column or field the issue is attached to.
    pub location: String,
    /// Description of the issue.
    pub message: String,
    /// Severity of the issue.
    pub severity: IssueSeverity,
}

impl SyncIssue {
    /// Creates a warning issue.
    #[must_use]
    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    /// Creates an error issue.
    #[must_use]
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }
}

impl From<Error> for SyncIssue {
    fn from(err: Error) -> Self {
        match err {
            Error::MalformedCell { column, source } => Self::error(column, source.to_string()),
            Error::UnsupportedShape { field, reason } => Self::warning(field, reason),
            other => Self::error(String::new(), other.to_string()),
        }
    }
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.location, self.message)
    }
}
