//! Error types for declaration and parsing.
//!
//! Two families are kept apart:
//!
//! - [`DeclError`]: a broken declaration (duplicate alias, unnamed positional
//!   option, ...). These are programming errors, returned immediately by
//!   [`CmdLine::add`](crate::CmdLine::add) and never accumulated.
//! - [`ParseError`]: a problem with the user's arguments. Depending on the
//!   [`ErrorMode`](crate::ErrorMode) parsing stops at the first one or
//!   collects all of them into a [`ParseOutcome`](crate::ParseOutcome).

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::group::GroupConstraint;

/// Structural errors raised while declaring options and groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclError {
    /// Two options claim the same alias.
    #[error("option '{0}' already exists")]
    DuplicateAlias(String),

    /// Two groups share a name.
    #[error("option group '{0}' already exists")]
    DuplicateGroup(String),

    /// Positional options are matched by position but still need a name for
    /// messages.
    #[error("positional options need a valid name")]
    UnnamedPositional,

    /// A named-style option has neither a name nor enumerated values.
    #[error("option name is empty and option does not provide allowed values")]
    MissingName,

    /// No group with this name is registered.
    #[error("option group '{0}' does not exist")]
    UnknownGroup(String),

    /// A group refers to an option that is not registered here.
    #[error("option group '{group}' refers to an unknown option")]
    UnknownOption { group: String },
}

/// Result of declaring options and groups.
pub type Result<T> = std::result::Result<T, DeclError>;

/// Errors caused by the arguments being parsed.
///
/// Every variant carries the offending token or the display name of the
/// option involved, so a caller can render or match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// A dash-prefixed token that matches no option.
    #[error("unknown option '{token}'")]
    UnknownOption { token: String },

    /// A positional token with no positional option left to take it.
    #[error("unhandled positional argument: '{token}'")]
    UnhandledPositional { token: String },

    /// The option needs a value and none was available.
    #[error("option '{option}' requires an argument")]
    MissingArgument { option: String },

    /// An option inside a short-option cluster needs a value but is not last.
    #[error("option '{option}' requires an argument (must be last in '{cluster}')")]
    MissingArgumentInGroup { option: String, cluster: String },

    /// A value was given to an option that takes none.
    #[error("option '{option}' doesn't allow an argument")]
    UnexpectedArgument { option: String },

    /// The option may not occur again.
    #[error("option '{option}' already specified")]
    AlreadySpecified { option: String },

    /// The value parser rejected the text.
    #[error("invalid argument '{value}' for option '{option}': {reason}")]
    InvalidArgument {
        option: String,
        value: String,
        reason: String,
    },

    /// A group's cardinality rule does not hold.
    #[error("option group '{group}': {} ({count} specified)", .constraint.requirement())]
    GroupConstraintViolated {
        group: String,
        constraint: GroupConstraint,
        count: usize,
    },

    /// A required option never occurred.
    #[error("option '{option}' missing")]
    MissingRequiredOption { option: String },

    /// A response file could not be read.
    #[error("cannot read response file '{path}': {message}")]
    Io { path: String, message: String },

    /// Response files nest deeper (or more often) than allowed.
    #[error("too many response files encountered (limit {limit})")]
    TooManyResponseFiles { limit: usize },
}

/// A non-empty list of parse errors, for callers that prefer `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
