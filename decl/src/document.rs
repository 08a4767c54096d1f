//! Declaration documents: options, groups and engine switches as data.
//!
//! A document is read from YAML or JSON. Every field except an option's
//! `name` (and a group's `name`) may be omitted.
//!
//! # Example YAML
//!
//! ```yaml
//! config:
//!   error_mode: accumulate
//!   ignore_unknowns: false
//! options:
//!   - name: v|verbose
//!     kind: bool
//!     formatting: grouping
//!     occurrence: zero_or_more
//!   - name: o|output
//!     arg_name: file
//!     arg: required
//!     desc: Write output to FILE
//!   - name: O
//!     kind: int
//!     formatting: prefix
//!   - name: files
//!     multiple: true
//!     formatting: positional
//! groups:
//!   - name: mode
//!     constraint: zero_or_one
//!     members: [verbose, output]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cmdline_core::{
    ArgRequirement, CmdLine, Formatting, GroupConstraint, Handle, MapParser, MiscFlags,
    Occurrence, Opt, OptionGroup, ParseConfig, Value, ValueParser,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::report::Declaration;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Guesses the format from the first non-blank character.
    pub fn detect(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// The type of value an option holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    String,
    Int,
    Float,
    Bool,
}

impl ValueKind {
    /// Parses raw argument text into a JSON value of this kind.
    pub fn parse(self, raw: &str) -> std::result::Result<Json, String> {
        match self {
            ValueKind::String => Ok(Json::String(raw.to_string())),
            ValueKind::Int => i64::parse_value(raw).map(Json::from),
            ValueKind::Float => {
                let f = f64::parse_value(raw)?;
                serde_json::Number::from_f64(f)
                    .map(Json::Number)
                    .ok_or_else(|| format!("'{raw}' is not a finite number"))
            }
            ValueKind::Bool => bool::parse_value(raw).map(Json::Bool),
        }
    }

    /// Whether a declared default fits this kind.
    pub fn accepts(self, value: &Json) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Int => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_number(),
            ValueKind::Bool => value.is_boolean(),
        }
    }

    fn initial(self) -> Json {
        match self {
            ValueKind::Bool => Json::Bool(false),
            _ => Json::Null,
        }
    }
}

/// Parses values of a [`ValueKind`].
#[derive(Debug, Clone, Copy)]
struct KindParser(ValueKind);

impl ValueParser<Json> for KindParser {
    fn parse(&self, _name: &str, raw: &str) -> std::result::Result<Json, String> {
        self.0.parse(raw)
    }
}

/// One declared option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDecl {
    /// Pipe-separated aliases. May be empty when `values` is given.
    pub name: String,
    pub arg_name: String,
    pub desc: String,
    pub kind: ValueKind,
    /// Collect every value into an array instead of keeping the last one.
    pub multiple: bool,
    /// Defaults to `optional`, or `zero_or_more` when `multiple` is set.
    pub occurrence: Option<Occurrence>,
    pub arg: ArgRequirement,
    pub formatting: Formatting,
    pub comma_separated: bool,
    pub consume_after: bool,
    pub hidden: bool,
    /// Accepted spellings and the value each one stands for.
    pub values: BTreeMap<String, Json>,
    pub default: Option<Json>,
}

impl Default for OptionDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            arg_name: "arg".to_string(),
            desc: String::new(),
            kind: ValueKind::String,
            multiple: false,
            occurrence: None,
            arg: ArgRequirement::Optional,
            formatting: Formatting::Default,
            comma_separated: false,
            consume_after: false,
            hidden: false,
            values: BTreeMap::new(),
            default: None,
        }
    }
}

impl OptionDecl {
    /// Name used in error messages about this declaration.
    fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.arg_name
        } else {
            &self.name
        }
    }

    fn flags(&self) -> MiscFlags {
        let mut flags = MiscFlags::NONE;
        if self.comma_separated {
            flags |= MiscFlags::COMMA_SEPARATED;
        }
        if self.consume_after {
            flags |= MiscFlags::CONSUME_AFTER;
        }
        if self.hidden {
            flags |= MiscFlags::HIDDEN;
        }
        flags
    }

    fn initial_value(&self) -> Result<Json> {
        let invalid = |reason: String| DocumentError::InvalidDefault {
            option: self.label().to_string(),
            reason,
        };

        let Some(default) = &self.default else {
            return Ok(if self.multiple {
                Json::Array(Vec::new())
            } else {
                self.kind.initial()
            });
        };

        // Enumerated options take defaults from their value table as-is.
        let typed = self.values.is_empty();

        match (self.multiple, default) {
            (true, Json::Array(items)) => {
                if typed {
                    if let Some(bad) = items.iter().find(|v| !self.kind.accepts(v)) {
                        return Err(invalid(format!("{bad} is not a {:?} value", self.kind)));
                    }
                }
                Ok(default.clone())
            }
            (_, single) => {
                if typed && !single.is_null() && !self.kind.accepts(single) {
                    return Err(invalid(format!("{single} is not a {:?} value", self.kind)));
                }
                if self.multiple {
                    Ok(Json::Array(vec![single.clone()]))
                } else {
                    Ok(single.clone())
                }
            }
        }
    }

    fn to_opt(&self) -> Result<Opt<Json>> {
        let init = self.initial_value()?;
        let opt = if self.values.is_empty() {
            self.build(init, KindParser(self.kind))
        } else {
            self.build(init, MapParser::new(self.values.clone()))
        };
        Ok(opt)
    }

    fn build(&self, init: Json, parser: impl ValueParser<Json> + 'static) -> Opt<Json> {
        let mut opt = if self.multiple {
            Opt::container_with(self.name.clone(), init, parser, push_value)
        } else {
            Opt::scalar_with(self.name.clone(), init, parser)
        };
        if let Some(occurrence) = self.occurrence {
            opt = opt.occurrence(occurrence);
        }
        opt.arg_name(self.arg_name.clone())
            .desc(self.desc.clone())
            .arg(self.arg)
            .formatting(self.formatting)
            .flags(self.flags())
    }
}

fn push_value(slot: &mut Json, value: Json) {
    match slot {
        Json::Array(items) => items.push(value),
        other => *other = Json::Array(vec![value]),
    }
}

/// One declared group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDecl {
    pub name: String,
    #[serde(default)]
    pub constraint: GroupConstraint,
    /// Any alias of each member option.
    #[serde(default)]
    pub members: Vec<String>,
}

/// A complete declaration document.
///
/// # Examples
///
/// ```
/// use cmdline_decl::Document;
///
/// let doc = Document::from_yaml_str(
///     "options:\n  - name: n|count\n    kind: int\n    arg: required\n",
/// )
/// .unwrap();
///
/// let mut decl = doc.build().unwrap();
/// let report = decl.parse(["--count", "0x10"]);
/// assert!(report.success);
/// assert_eq!(report.options["n"].value, serde_json::json!(16));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub config: ParseConfig,
    pub options: Vec<OptionDecl>,
    pub groups: Vec<GroupDecl>,
}

impl Document {
    /// Loads a document, choosing JSON or YAML by file extension.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DocumentError::IoError) if the file cannot be
    /// read, or a JSON/YAML error if it does not deserialize.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let doc = Self::from_str_as(&text, DocumentFormat::from_path(path))?;
        debug!(
            path = %path.display(),
            options = doc.options.len(),
            groups = doc.groups.len(),
            "Loaded declaration document"
        );
        Ok(doc)
    }

    /// Parses a document whose format is guessed from its content.
    pub fn from_str_detect(text: &str) -> Result<Self> {
        Self::from_str_as(text, DocumentFormat::detect(text))
    }

    pub fn from_str_as(text: &str, format: DocumentFormat) -> Result<Self> {
        match format {
            DocumentFormat::Json => Self::from_json_str(text),
            DocumentFormat::Yaml => Self::from_yaml_str(text),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Registers every option and group on a fresh [`CmdLine`].
    ///
    /// # Errors
    ///
    /// Fails on structural problems (duplicate aliases or groups, unnamed
    /// positionals, nameless options without values), on two options sharing
    /// a report name, on defaults that do not match the option kind, and on
    /// group members that name no option.
    pub fn build(&self) -> Result<Declaration> {
        let mut cmd = CmdLine::with_config(self.config.clone());
        let mut handles: Vec<Handle<Json>> = Vec::with_capacity(self.options.len());
        let mut by_alias: BTreeMap<&str, Handle<Json>> = BTreeMap::new();

        let mut report_names: BTreeSet<String> = BTreeSet::new();

        for decl in &self.options {
            let handle = cmd.add(decl.to_opt()?)?;

            // Report keys must be unique, positionals and nameless options included.
            let display = cmd
                .entry(handle.id())
                .map(|entry| entry.display_name().to_string())
                .unwrap_or_default();
            if !report_names.insert(display.clone()) {
                return Err(DocumentError::DuplicateName { name: display });
            }

            let names = decl
                .name
                .split('|')
                .chain(std::iter::once(decl.name.as_str()))
                .filter(|a| !a.is_empty());
            for alias in names {
                let clash = by_alias
                    .insert(alias, handle)
                    .is_some_and(|prev| prev.id() != handle.id());
                if clash {
                    return Err(DocumentError::DuplicateName {
                        name: alias.to_string(),
                    });
                }
            }
            handles.push(handle);
        }

        for decl in &self.groups {
            let mut group = OptionGroup::new(decl.name.clone(), decl.constraint);
            for member in &decl.members {
                let handle =
                    by_alias
                        .get(member.as_str())
                        .ok_or_else(|| DocumentError::UnknownMember {
                            group: decl.name.clone(),
                            member: member.clone(),
                        })?;
                group = group.with(handle);
            }
            cmd.add_group(group)?;
        }

        debug!(
            options = handles.len(),
            groups = self.groups.len(),
            "Built command line from document"
        );

        Ok(Declaration::new(cmd, handles))
    }
}
