//! Runtime error types for compiled routines.

use sieve_types::RefId;
use thiserror::Error;

use crate::refs::RuleError;
use crate::reporter::ValidationError;

/// Why a compiled routine returned no output.
#[derive(Debug, Error)]
pub enum RunError {
    /// One or more fields failed validation. Raised once, after the walk.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A reference id is missing from the table, or names the wrong kind
    /// of function.
    #[error("unresolved reference '{id}': expected {expected}")]
    UnresolvedRef { id: RefId, expected: &'static str },

    /// A rule failed outright instead of reporting. Aborts the walk.
    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: RefId,
        #[source]
        source: RuleError,
    },
}

impl RunError {
    /// The aggregate validation error, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias for runtime operations.
pub type RunResult<T> = Result<T, RunError>;
