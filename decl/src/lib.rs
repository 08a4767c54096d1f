//! Declarative option documents for the `cmdline-core` engine.
//!
//! A [`Document`] describes options, groups and engine switches in YAML or
//! JSON. [`Document::build`] registers them on a
//! [`CmdLine`](cmdline_core::CmdLine) whose values are `serde_json::Value`s,
//! and every parse yields a serializable [`ParseReport`].
//!
//! # Quick start
//!
//! ```
//! use cmdline_decl::Document;
//!
//! let doc = Document::from_yaml_str(r#"
//! options:
//!   - name: I
//!     multiple: true
//!     formatting: prefix
//!   - name: level
//!     values: { fast: 1, small: 2 }
//!     arg: required
//! "#).unwrap();
//!
//! let mut decl = doc.build().unwrap();
//! let report = decl.parse(["-Iinclude", "--level=small"]);
//! assert!(report.success);
//! assert_eq!(report.options["I"].value, serde_json::json!(["include"]));
//! assert_eq!(report.options["level"].value, serde_json::json!(2));
//! ```

mod document;
mod error;
mod report;

pub use document::{Document, DocumentFormat, GroupDecl, OptionDecl, ValueKind};
pub use error::{DocumentError, Result};
pub use report::{Declaration, OptionReport, ParseReport};
