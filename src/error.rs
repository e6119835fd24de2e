//! Error types for filter parsing and query execution.
//!
//! Parse-time problems are reported per token ([`TokenError`]) and collected
//! into a single [`FilterErrors`] so one retry can fix every mistake at once.
//! Store failures surface as [`Error::Execution`] with the SQLite diagnostic
//! attached.

use std::fmt;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling or running a filter.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more filter tokens were rejected. Nothing was executed.
    #[error(transparent)]
    Filter(#[from] FilterErrors),

    /// The store failed while running a compiled query.
    #[error("query execution failed: {0}")]
    Execution(#[source] rusqlite::Error),

    /// The store could not be opened or prepared.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

/// A problem with a single filter token.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    /// Malformed token: no colon, empty key or value, or an unparsable operand.
    #[error("syntax error in `{token}`: {reason}")]
    Syntax { token: String, reason: String },

    /// The key is not part of the filter vocabulary.
    #[error("unknown field `{key}` in `{token}`")]
    UnknownField { token: String, key: String },

    /// Closed range whose lower end exceeds its upper end.
    #[error("invalid range in `{token}`: {min} is greater than {max}")]
    InvalidRange {
        token: String,
        min: String,
        max: String,
    },

    /// Value outside a fixed set of accepted words.
    #[error("invalid value in `{token}`: expected one of {expected}")]
    InvalidEnum {
        token: String,
        expected: &'static str,
    },

    /// Unrecognised sort order.
    #[error("unknown sort order in `{token}`: expected one of {expected}")]
    InvalidSort {
        token: String,
        expected: &'static str,
    },

    /// More than one sort token in the same filter.
    #[error("duplicate sort in `{token}`: only one sort token is allowed")]
    DuplicateSort { token: String },
}

impl TokenError {
    pub(crate) fn syntax(token: impl Into<String>, reason: impl Into<String>) -> Self {
        TokenError::Syntax {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// The offending token as the user typed it.
    pub fn token(&self) -> &str {
        match self {
            TokenError::Syntax { token, .. }
            | TokenError::UnknownField { token, .. }
            | TokenError::InvalidRange { token, .. }
            | TokenError::InvalidEnum { token, .. }
            | TokenError::InvalidSort { token, .. }
            | TokenError::DuplicateSort { token } => token,
        }
    }
}

/// Every token error found in one filter, in input order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterErrors(Vec<TokenError>);

impl FilterErrors {
    /// Wrap a list of token errors; `None` when the list is empty.
    pub fn from_vec(errors: Vec<TokenError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[TokenError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenError> {
        self.0.iter()
    }
}

impl fmt::Display for FilterErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.0.len() == 1 { "" } else { "s" };
        write!(f, "invalid filter ({} bad token{plural})", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FilterErrors {}

impl<'a> IntoIterator for &'a FilterErrors {
    type Item = &'a TokenError;
    type IntoIter = std::slice::Iter<'a, TokenError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
