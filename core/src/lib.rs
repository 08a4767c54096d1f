//! Command-line argument parsing engine.
//!
//! This crate turns an argument vector into typed values held by declared
//! options:
//!
//! - [`Opt`]: an option declaration builder (aliases, occurrence policy,
//!   value requirement, formatting, flags, storage and value parser).
//! - [`CmdLine`]: the registry of options and [`OptionGroup`]s, and the
//!   dispatcher that classifies each token and stores its value.
//! - [`ParseOutcome`]: the errors and unrecognized tokens of one parse.
//!
//! Values are converted by [`ValueParser`]s ([`Parser`] for the common
//! types, [`MapParser`] for enumerated spellings). `@file` arguments are
//! expanded by [`expand_response_files`] using the Unix or Windows
//! tokenizer ([`ResponseFileSyntax`]).
//!
//! Engine switches live in [`ParseConfig`]. Errors either stop the parse or
//! are accumulated ([`ErrorMode`]).
//!
//! # Example
//!
//! ```
//! use cmdline_core::*;
//!
//! let mut cmd = CmdLine::new();
//! let verbose = cmd.add(Opt::<bool>::scalar("v|verbose").grouping()).unwrap();
//! let force = cmd.add(Opt::<bool>::scalar("f").grouping()).unwrap();
//! let level = cmd.add(Opt::<u32>::scalar("O").prefix()).unwrap();
//! let defines = cmd.add(Opt::<Vec<String>>::list("D").prefix()).unwrap();
//! let files = cmd.add(Opt::<Vec<String>>::list("files").positional()).unwrap();
//!
//! let outcome = cmd.parse(["-vf", "-O2", "-DNDEBUG", "-DX=1", "main.c", "--", "-odd.c"]);
//! assert!(outcome.is_success(), "{:?}", outcome.errors);
//!
//! assert_eq!(cmd.value(&verbose), Some(&true));
//! assert_eq!(cmd.count(&force), 1);
//! assert_eq!(cmd.value(&level), Some(&2));
//! assert_eq!(cmd.value(&defines).unwrap(), &["NDEBUG", "X=1"]);
//! assert_eq!(cmd.value(&files).unwrap(), &["main.c", "-odd.c"]);
//! ```

mod cmdline;
mod config;
mod error;
pub mod expand;
mod group;
mod options;
pub mod parser;
pub mod split;
pub mod tokenize;

pub use cmdline::{CmdLine, ParseOutcome};
pub use config::{ErrorMode, ParseConfig};
pub use error::{DeclError, ParseError, ParseErrors};
pub use expand::{DEFAULT_RESPONSE_FILE_LIMIT, expand_response_files};
pub use group::{GroupConstraint, OptionGroup};
pub use options::{
    ArgRequirement, Formatting, Handle, MiscFlags, Occurrence, Opt, OptionEntry, OptionId,
    OptionInfo, StorageKind,
};
pub use parser::{MapParser, Parser, Value, ValueParser};
pub use tokenize::ResponseFileSyntax;
