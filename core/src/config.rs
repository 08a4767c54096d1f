//! Engine configuration.
//!
//! [`ParseConfig`] is plain data with serde support, so it can be embedded in
//! a declaration document and every field may be omitted.
//!
//! # Example YAML
//!
//! ```yaml
//! ignore_unknowns: false
//! allow_missing_required: false
//! error_mode: accumulate
//! diagnostics: false
//! response_files: true
//! response_file_syntax: unix
//! max_response_files: 100
//! ```

use serde::{Deserialize, Serialize};

use crate::expand::DEFAULT_RESPONSE_FILE_LIMIT;
use crate::tokenize::ResponseFileSyntax;

/// What happens after the first runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Abort the parse and report only that error.
    StopOnFirst,
    /// Record the error, continue with the next token, and report
    /// everything at the end.
    #[default]
    Accumulate,
}

/// Global engine switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Collect unknown options and unhandled positionals into
    /// [`ParseOutcome::unknowns`](crate::ParseOutcome::unknowns) instead of
    /// failing.
    pub ignore_unknowns: bool,
    /// Skip the final check for required options.
    pub allow_missing_required: bool,
    pub error_mode: ErrorMode,
    /// Write each error to stderr as `error: <message>` when parsing ends.
    pub diagnostics: bool,
    /// Expand `@file` tokens in
    /// [`CmdLine::expand_and_parse`](crate::CmdLine::expand_and_parse).
    pub response_files: bool,
    pub response_file_syntax: ResponseFileSyntax,
    /// Maximum number of response files expanded in one parse.
    pub max_response_files: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            ignore_unknowns: false,
            allow_missing_required: false,
            error_mode: ErrorMode::Accumulate,
            diagnostics: false,
            response_files: true,
            response_file_syntax: ResponseFileSyntax::Unix,
            max_response_files: DEFAULT_RESPONSE_FILE_LIMIT,
        }
    }
}

impl ParseConfig {
    pub fn stop_on_first_error(&self) -> bool {
        self.error_mode == ErrorMode::StopOnFirst
    }
}
