//! Error types for declaration documents.
//!
//! Covers reading and deserializing a document as well as turning it into a
//! working [`CmdLine`](cmdline_core::CmdLine).

use cmdline_core::DeclError;
use thiserror::Error;

/// Errors that can occur while loading or building a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The declared options or groups are inconsistent.
    #[error("invalid declaration: {0}")]
    Decl(#[from] DeclError),

    /// A group lists an option name that no option declares.
    #[error("group '{group}' refers to undeclared option '{member}'")]
    UnknownMember { group: String, member: String },

    /// Two options would be reported, or referenced by groups, under the
    /// same name.
    #[error("more than one option is named '{name}'")]
    DuplicateName { name: String },

    /// A declared default does not match the option's kind.
    #[error("invalid default for option '{option}': {reason}")]
    InvalidDefault { option: String, reason: String },
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
