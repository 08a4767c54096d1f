//! Response-file expansion.
//!
//! A token of the form `@path` is replaced, in place, by the words read from
//! `path`. Expansion then continues at the first inserted word, so response
//! files may reference further response files. The number of expansions is
//! bounded, which also stops a file that (directly or through a chain)
//! includes itself.

use std::fs;

use tracing::debug;

use crate::error::ParseError;
use crate::tokenize::ResponseFileSyntax;

/// Default bound on the number of response files expanded per parse.
pub const DEFAULT_RESPONSE_FILE_LIMIT: usize = 100;

/// Expands every `@file` token in `args`.
///
/// Returns the number of files expanded.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if a referenced file cannot be read, and
/// [`ParseError::TooManyResponseFiles`] when more than `limit` files would
/// be expanded. `args` may be partially expanded when an error is returned.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use cmdline_core::expand::expand_response_files;
/// use cmdline_core::tokenize::ResponseFileSyntax;
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// write!(file, "--x 1 --y 2").unwrap();
///
/// let mut args = vec![format!("@{}", file.path().display()), "-z".to_string()];
/// expand_response_files(&mut args, ResponseFileSyntax::Unix, 100).unwrap();
/// assert_eq!(args, ["--x", "1", "--y", "2", "-z"]);
/// ```
pub fn expand_response_files(
    args: &mut Vec<String>,
    syntax: ResponseFileSyntax,
    limit: usize,
) -> Result<usize, ParseError> {
    let mut expanded = 0;
    let mut i = 0;

    while i < args.len() {
        let Some(path) = args[i].strip_prefix('@') else {
            i += 1;
            continue;
        };

        if expanded == limit {
            return Err(ParseError::TooManyResponseFiles { limit });
        }

        let path = path.to_string();
        let contents = fs::read_to_string(&path).map_err(|e| ParseError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let words = syntax.tokenize(&contents);
        debug!(path = %path, words = words.len(), "Expanded response file");

        args.splice(i..=i, words);
        expanded += 1;
    }

    Ok(expanded)
}
