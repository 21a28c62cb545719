// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII Enrichment Error Types
//!
//! Two failure families exist:
//! - configuration problems, accumulated while resolving field specifications and
//!   surfaced together as [`PiiError::Configuration`] before any event is processed;
//! - per-event failures, of which [`PiiError::MalformedEventField`] is the only one the
//!   transform itself can raise.

use std::fmt;
use thiserror::Error;

/// Result type for PII enrichment operations
pub type PiiResult<T> = Result<T, PiiError>;

/// PII enrichment error types
#[derive(Error, Debug)]
pub enum PiiError {
    #[error("Invalid PII enrichment configuration ({} problem(s)): {}", .problems.len(), ConfigProblems(.problems))]
    Configuration { problems: Vec<ConfigProblem> },

    #[error("Event field '{field}' does not hold valid JSON: {source}")]
    MalformedEventField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed audit record: {message}")]
    MalformedAuditRecord { message: String },

    #[error("Cannot load configuration file '{path}': {message}")]
    ConfigFile { path: String, message: String },
}

impl PiiError {
    /// Create a configuration error from accumulated problems
    pub fn configuration(problems: Vec<ConfigProblem>) -> Self {
        Self::Configuration { problems }
    }

    /// Create a malformed event field error
    pub fn malformed_event_field(field: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedEventField {
            field: field.into(),
            source,
        }
    }

    /// Create a malformed audit record error
    pub fn malformed_audit_record(message: impl Into<String>) -> Self {
        Self::MalformedAuditRecord {
            message: message.into(),
        }
    }

    /// Create a configuration file error
    pub fn config_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Problems carried by a configuration error, empty for every other kind
    pub fn problems(&self) -> &[ConfigProblem] {
        match self {
            Self::Configuration { problems } => problems,
            _ => &[],
        }
    }

    /// Name of the event field that failed to parse, if this is a per-event error
    pub fn event_field(&self) -> Option<&str> {
        match self {
            Self::MalformedEventField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// A single problem found while resolving PII configuration
///
/// `entry` is the zero-based position of the offending item in `parameters.pii`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigProblem {
    #[error("unsupported hash function '{name}'")]
    UnsupportedAlgorithm { name: String },

    #[error("{} is missing required attribute '{attribute}'", EntryLabel(.entry))]
    MissingAttribute {
        entry: Option<usize>,
        attribute: String,
    },

    #[error("attribute '{attribute}' is invalid: {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    #[error("pii entry #{entry} must be tagged with exactly one of 'pojo' or 'json'")]
    UnknownEntryKind { entry: usize },

    #[error("pii entry #{entry} references unknown scalar field '{field}'")]
    UnknownScalarField { entry: usize, field: String },

    #[error("pii entry #{entry} references unknown JSON field '{field}'")]
    UnknownJsonField { entry: usize, field: String },

    #[error("pii entry #{entry} has invalid schema criterion '{criterion}': {reason}")]
    InvalidSchemaCriterion {
        entry: usize,
        criterion: String,
        reason: String,
    },

    #[error("pii entry #{entry} has invalid JSON path '{path}': {reason}")]
    InvalidJsonPath {
        entry: usize,
        path: String,
        reason: String,
    },
}

impl ConfigProblem {
    pub fn missing(entry: Option<usize>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            entry,
            attribute: attribute.into(),
        }
    }

    pub fn invalid(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

struct EntryLabel<'a>(&'a Option<usize>);

impl fmt::Display for EntryLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(idx) => write!(f, "pii entry #{}", idx),
            None => f.write_str("configuration"),
        }
    }
}

struct ConfigProblems<'a>(&'a [ConfigProblem]);

impl fmt::Display for ConfigProblems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", problem)?;
        }
        Ok(())
    }
}
