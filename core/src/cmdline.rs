//! The option registry and the argument dispatcher.
//!
//! [`CmdLine`] owns every declared option and group. Parsing walks the
//! argument list once, left to right:
//!
//! 1. The first `--` switches every later token to positional handling.
//! 2. Tokens without a leading dash, a bare `-`, and everything after `--`
//!    go to the next positional option that may still occur.
//! 3. Anything else loses one leading dash (two for the long form) and is
//!    matched, in order, as an exact alias, as `name=value`, as a prefix
//!    option with an inline value, and (short form only) as a cluster of
//!    single-character grouping flags.
//!
//! Group constraints and required options are checked after the last token.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ParseConfig;
use crate::error::{DeclError, ParseError, ParseErrors, Result};
use crate::expand::expand_response_files;
use crate::group::OptionGroup;
use crate::options::{
    ArgRequirement, Formatting, Handle, MiscFlags, Opt, OptionEntry, OptionId,
};
use crate::split::{Delimiter, Filter, split};

/// What a parse produced besides the stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    /// Every runtime error, in the order encountered.
    pub errors: Vec<ParseError>,
    /// Tokens skipped because unknown arguments are tolerated.
    pub unknowns: Vec<String>,
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into a `Result` holding the unrecognized tokens.
    ///
    /// # Errors
    ///
    /// Returns all collected errors if there was at least one.
    pub fn into_result(self) -> std::result::Result<Vec<String>, ParseErrors> {
        if self.errors.is_empty() {
            Ok(self.unknowns)
        } else {
            Err(ParseErrors(self.errors))
        }
    }
}

/// Cursor state of one pass over the arguments.
struct Session<'a> {
    args: &'a [String],
    index: usize,
    positional: usize,
    dashdash: bool,
    unknowns: Vec<String>,
}

impl<'a> Session<'a> {
    fn new(args: &'a [String]) -> Self {
        Self {
            args,
            index: 0,
            positional: 0,
            dashdash: false,
            unknowns: Vec::new(),
        }
    }

    /// Takes the token after the current one, if any.
    fn bump(&mut self) -> Option<&'a str> {
        let args = self.args;
        let next = args.get(self.index + 1)?;
        self.index += 1;
        Some(next.as_str())
    }
}

/// A set of declared options and groups, and the parser that fills them.
///
/// # Examples
///
/// ```
/// use cmdline_core::{CmdLine, Opt};
///
/// let mut cmd = CmdLine::new();
/// let output = cmd.add(Opt::<String>::scalar("o|output").arg_required()).unwrap();
/// let inputs = cmd.add(Opt::<Vec<String>>::list("inputs").positional()).unwrap();
///
/// let outcome = cmd.parse(["-o", "out.txt", "a.c", "b.c"]);
/// assert!(outcome.is_success());
/// assert_eq!(cmd.value(&output).unwrap(), "out.txt");
/// assert_eq!(cmd.value(&inputs).unwrap(), &["a.c", "b.c"]);
/// ```
#[derive(Debug, Default)]
pub struct CmdLine {
    entries: Vec<OptionEntry>,
    aliases: BTreeMap<String, OptionId>,
    positionals: Vec<OptionId>,
    groups: BTreeMap<String, OptionGroup>,
    max_prefix_len: usize,
    config: ParseConfig,
}

impl CmdLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ParseConfig {
        &mut self.config
    }

    /// Registers an option.
    ///
    /// # Errors
    ///
    /// Fails without registering anything if an alias is already taken, a
    /// positional option has no name, or a named-style option has neither a
    /// name nor enumerated values.
    pub fn add<C: 'static>(&mut self, opt: Opt<C>) -> Result<Handle<C>> {
        let entry = OptionEntry::new(opt.info, opt.store);
        let id = OptionId(self.entries.len());

        if entry.info().formatting == Formatting::Positional {
            if entry.info().name.is_empty() {
                return Err(DeclError::UnnamedPositional);
            }
            self.positionals.push(id);
        } else {
            let aliases = entry.aliases();
            if aliases.is_empty() {
                return Err(DeclError::MissingName);
            }

            for (i, alias) in aliases.iter().enumerate() {
                if self.aliases.contains_key(alias) || aliases[..i].contains(alias) {
                    return Err(DeclError::DuplicateAlias(alias.clone()));
                }
            }

            if entry.is_prefix() {
                let longest = aliases.iter().map(String::len).max().unwrap_or(0);
                self.max_prefix_len = self.max_prefix_len.max(longest);
            }

            for alias in aliases {
                self.aliases.insert(alias, id);
            }
        }

        debug!(
            option = %entry.display_name(),
            formatting = ?entry.info().formatting,
            "Registered option"
        );

        self.entries.push(entry);
        Ok(Handle::new(id))
    }

    /// Registers a group.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken or a member is not an option of this
    /// command line.
    pub fn add_group(&mut self, group: OptionGroup) -> Result<()> {
        if self.groups.contains_key(group.name()) {
            return Err(DeclError::DuplicateGroup(group.name().to_string()));
        }
        if group
            .members()
            .iter()
            .any(|id| id.index() >= self.entries.len())
        {
            return Err(DeclError::UnknownOption {
                group: group.name().to_string(),
            });
        }

        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    /// Adds an option to an already registered group. Adding an option that
    /// is already a member has no effect.
    ///
    /// # Errors
    ///
    /// Fails if no such group exists or the handle belongs elsewhere.
    pub fn group_add<C>(&mut self, group: &str, handle: &Handle<C>) -> Result<()> {
        if handle.id().index() >= self.entries.len() {
            return Err(DeclError::UnknownOption {
                group: group.to_string(),
            });
        }
        let target = self
            .groups
            .get_mut(group)
            .ok_or_else(|| DeclError::UnknownGroup(group.to_string()))?;
        target.add(handle.id());
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&OptionGroup> {
        self.groups.get(name)
    }

    /// Groups ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = &OptionGroup> {
        self.groups.values()
    }

    /// Looks up the option registered under `alias`.
    pub fn find(&self, alias: &str) -> Option<&OptionEntry> {
        let id = self.aliases.get(alias)?;
        self.entries.get(id.index())
    }

    pub fn entry(&self, id: OptionId) -> Option<&OptionEntry> {
        self.entries.get(id.index())
    }

    /// All options in declaration order, positionals included.
    pub fn options(&self) -> &[OptionEntry] {
        &self.entries
    }

    /// Positional options in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = &OptionEntry> {
        self.positionals
            .iter()
            .filter_map(|id| self.entries.get(id.index()))
    }

    /// Every non-positional option once, sorted by declared name string.
    pub fn unique_options(&self) -> Vec<&OptionEntry> {
        self.unique_option_ids()
            .into_iter()
            .filter_map(|id| self.entries.get(id.index()))
            .collect()
    }

    fn unique_option_ids(&self) -> Vec<OptionId> {
        let mut ids: Vec<OptionId> = self.aliases.values().copied().collect();
        ids.sort_by(|a, b| {
            let name = |id: &OptionId| self.entries[id.index()].info().name.as_str();
            name(a).cmp(name(b)).then(a.cmp(b))
        });
        ids.dedup();
        ids
    }

    /// The current value of an option.
    pub fn value<C: 'static>(&self, handle: &Handle<C>) -> Option<&C> {
        self.entries
            .get(handle.id().index())?
            .value()
            .downcast_ref::<C>()
    }

    pub fn value_mut<C: 'static>(&mut self, handle: &Handle<C>) -> Option<&mut C> {
        self.entries
            .get_mut(handle.id().index())?
            .value_mut()
            .downcast_mut::<C>()
    }

    /// Number of values stored for an option.
    pub fn count<C>(&self, handle: &Handle<C>) -> u32 {
        self.entries
            .get(handle.id().index())
            .map_or(0, OptionEntry::count)
    }

    /// Parses `args` (without the program name).
    pub fn parse<I, S>(&mut self, args: I) -> ParseOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.run(&args)
    }

    /// Expands `@file` arguments, then parses the result.
    ///
    /// Expansion is skipped when
    /// [`ParseConfig::response_files`] is off. A failed expansion is the
    /// only error reported.
    pub fn expand_and_parse<I, S>(&mut self, args: I) -> ParseOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();

        if self.config.response_files {
            if let Err(err) = expand_response_files(
                &mut args,
                self.config.response_file_syntax,
                self.config.max_response_files,
            ) {
                return self.finish(vec![err], Vec::new());
            }
        }

        self.run(&args)
    }

    fn run(&mut self, args: &[String]) -> ParseOutcome {
        debug!(
            args = args.len(),
            options = self.entries.len(),
            "Parsing command line"
        );

        let stop = self.config.stop_on_first_error();
        let mut session = Session::new(args);
        let mut errors = Vec::new();

        while session.index < args.len() {
            if let Err(err) = self.handle_arg(&mut session) {
                debug!(index = session.index, error = %err, "Argument rejected");
                errors.push(err);
                if stop {
                    return self.finish(errors, session.unknowns);
                }
            }
            session.index += 1;
        }

        for group in self.groups.values() {
            if let Err(err) = group.check(&self.entries) {
                errors.push(err);
                if stop {
                    return self.finish(errors, session.unknowns);
                }
            }
        }

        if !self.config.allow_missing_required {
            let ids = self
                .unique_option_ids()
                .into_iter()
                .chain(self.positionals.iter().copied());
            for id in ids {
                let entry = &self.entries[id.index()];
                if entry.is_occurrence_required() {
                    errors.push(ParseError::MissingRequiredOption {
                        option: entry.display_name().to_string(),
                    });
                    if stop {
                        break;
                    }
                }
            }
        }

        self.finish(errors, session.unknowns)
    }

    fn finish(&self, errors: Vec<ParseError>, unknowns: Vec<String>) -> ParseOutcome {
        if self.config.diagnostics {
            for err in &errors {
                eprintln!("error: {err}");
            }
        }
        ParseOutcome { errors, unknowns }
    }

    fn handle_arg(&mut self, s: &mut Session<'_>) -> std::result::Result<(), ParseError> {
        let args = s.args;
        let arg = args[s.index].as_str();

        if arg == "--" && !s.dashdash {
            s.dashdash = true;
            return Ok(());
        }

        if !arg.starts_with('-') || arg == "-" || s.dashdash {
            return self.handle_positional(s, arg);
        }

        let mut name = &arg[1..];
        let short = !name.starts_with('-');
        if !short {
            name = &name[1..];
        }

        if self.handle_option(s, name)? || self.handle_prefix(name)? {
            return Ok(());
        }
        if short && self.handle_group(s, name)? {
            return Ok(());
        }

        self.tolerate(
            s,
            arg,
            ParseError::UnknownOption {
                token: arg.to_string(),
            },
        )
    }

    fn tolerate(
        &self,
        s: &mut Session<'_>,
        token: &str,
        err: ParseError,
    ) -> std::result::Result<(), ParseError> {
        if !self.config.ignore_unknowns {
            return Err(err);
        }
        warn!(token, "Ignoring unrecognized argument");
        s.unknowns.push(token.to_string());
        Ok(())
    }

    fn handle_positional(
        &mut self,
        s: &mut Session<'_>,
        token: &str,
    ) -> std::result::Result<(), ParseError> {
        while let Some(&id) = self.positionals.get(s.positional) {
            let entry = &self.entries[id.index()];
            if !entry.is_occurrence_allowed() {
                s.positional += 1;
                continue;
            }

            let name = entry.display_name().to_string();
            let consume_after = entry.info().flags.contains(MiscFlags::CONSUME_AFTER);

            self.store_occurrence(id, &name, token)?;
            if consume_after {
                s.dashdash = true;
            }
            return Ok(());
        }

        self.tolerate(
            s,
            token,
            ParseError::UnhandledPositional {
                token: token.to_string(),
            },
        )
    }

    /// Exact alias, then `name=value`.
    fn handle_option(
        &mut self,
        s: &mut Session<'_>,
        name: &str,
    ) -> std::result::Result<bool, ParseError> {
        if let Some(&id) = self.aliases.get(name) {
            self.add_occurrence(s, id, name)?;
            return Ok(true);
        }

        let Some(eq) = name.find('=') else {
            return Ok(false);
        };
        let (alias, rest) = name.split_at(eq);
        let Some(&id) = self.aliases.get(alias) else {
            return Ok(false);
        };

        // Prefix options see the '=' as part of their value.
        let value = if self.entries[id.index()].is_prefix() {
            rest
        } else {
            &rest[1..]
        };
        self.add_occurrence_with(id, alias, value)?;
        Ok(true)
    }

    /// Longest registered prefix alias wins; the tail is the value.
    fn handle_prefix(&mut self, name: &str) -> std::result::Result<bool, ParseError> {
        let longest = self.max_prefix_len.min(name.len());

        for n in (1..=longest).rev() {
            if !name.is_char_boundary(n) {
                continue;
            }
            let (alias, tail) = name.split_at(n);
            let Some(&id) = self.aliases.get(alias) else {
                continue;
            };
            if self.entries[id.index()].is_prefix() {
                self.add_occurrence_with(id, alias, tail)?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// A cluster of single-character grouping flags, e.g. `-xvf`.
    fn handle_group(
        &mut self,
        s: &mut Session<'_>,
        name: &str,
    ) -> std::result::Result<bool, ParseError> {
        let mut cluster = Vec::with_capacity(name.len());

        for (i, ch) in name.char_indices() {
            let alias = &name[i..i + ch.len_utf8()];
            match self.aliases.get(alias) {
                Some(&id) if self.entries[id.index()].info().formatting == Formatting::Grouping => {
                    cluster.push((id, alias));
                }
                _ => return Ok(false),
            }
        }

        let Some((_, init)) = cluster.split_last() else {
            return Ok(false);
        };

        for &(id, _) in init {
            let entry = &self.entries[id.index()];
            if entry.info().arg == ArgRequirement::Required {
                return Err(ParseError::MissingArgumentInGroup {
                    option: entry.display_name().to_string(),
                    cluster: name.to_string(),
                });
            }
        }

        for (id, alias) in cluster {
            self.add_occurrence(s, id, alias)?;
        }
        Ok(true)
    }

    /// An occurrence without an inline value. A required value is taken
    /// from the next token.
    fn add_occurrence(
        &mut self,
        s: &mut Session<'_>,
        id: OptionId,
        name: &str,
    ) -> std::result::Result<(), ParseError> {
        let entry = &self.entries[id.index()];
        let info = entry.info();
        let mut value = "";

        if info.formatting != Formatting::Positional && info.arg == ArgRequirement::Required {
            let stolen = if info.formatting == Formatting::Prefix {
                None
            } else {
                s.bump()
            };
            match stolen {
                Some(next) => value = next,
                None => {
                    return Err(ParseError::MissingArgument {
                        option: entry.display_name().to_string(),
                    });
                }
            }
        }

        self.store_occurrence(id, name, value)
    }

    /// An occurrence with an inline value.
    fn add_occurrence_with(
        &mut self,
        id: OptionId,
        name: &str,
        value: &str,
    ) -> std::result::Result<(), ParseError> {
        let entry = &self.entries[id.index()];
        let info = entry.info();

        if info.formatting != Formatting::Positional && info.arg == ArgRequirement::Disallowed {
            return Err(ParseError::UnexpectedArgument {
                option: entry.display_name().to_string(),
            });
        }

        self.store_occurrence(id, name, value)
    }

    fn store_occurrence(
        &mut self,
        id: OptionId,
        name: &str,
        value: &str,
    ) -> std::result::Result<(), ParseError> {
        let entry = &mut self.entries[id.index()];

        if !entry.is_occurrence_allowed() {
            return Err(ParseError::AlreadySpecified {
                option: entry.display_name().to_string(),
            });
        }

        if entry.info().flags.contains(MiscFlags::COMMA_SEPARATED) {
            for piece in split(value, Delimiter::Literal(","), Filter::KeepEmpty) {
                store_piece(entry, name, piece)?;
            }
            Ok(())
        } else {
            store_piece(entry, name, value)
        }
    }
}

fn store_piece(
    entry: &mut OptionEntry,
    name: &str,
    piece: &str,
) -> std::result::Result<(), ParseError> {
    entry
        .store_piece(name, piece)
        .map_err(|reason| ParseError::InvalidArgument {
            option: name.to_string(),
            value: piece.to_string(),
            reason,
        })?;
    debug!(option = name, value = piece, count = entry.count(), "Stored value");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupConstraint;

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut cmd = CmdLine::new();
        cmd.add(Opt::<bool>::scalar("v|verbose")).unwrap();
        let err = cmd.add(Opt::<bool>::scalar("q|verbose")).unwrap_err();
        assert_eq!(err, DeclError::DuplicateAlias("verbose".into()));
        assert!(cmd.find("q").is_none());

        let err = cmd.add(Opt::<bool>::scalar("x|x")).unwrap_err();
        assert_eq!(err, DeclError::DuplicateAlias("x".into()));
    }

    #[test]
    fn test_structural_errors() {
        let mut cmd = CmdLine::new();
        assert_eq!(
            cmd.add(Opt::<String>::scalar("").positional()).unwrap_err(),
            DeclError::UnnamedPositional
        );
        assert_eq!(
            cmd.add(Opt::<String>::scalar("")).unwrap_err(),
            DeclError::MissingName
        );

        cmd.add_group(OptionGroup::new("g", GroupConstraint::One))
            .unwrap();
        assert_eq!(
            cmd.add_group(OptionGroup::new("g", GroupConstraint::All))
                .unwrap_err(),
            DeclError::DuplicateGroup("g".into())
        );

        let a = cmd.add(Opt::<bool>::scalar("a")).unwrap();
        assert_eq!(
            cmd.group_add("nope", &a).unwrap_err(),
            DeclError::UnknownGroup("nope".into())
        );
    }

    #[test]
    fn test_group_add_is_idempotent() {
        let mut cmd = CmdLine::new();
        let a = cmd.add(Opt::<bool>::scalar("a")).unwrap();
        cmd.add_group(OptionGroup::new("g", GroupConstraint::One))
            .unwrap();
        cmd.group_add("g", &a).unwrap();
        cmd.group_add("g", &a).unwrap();
        assert_eq!(cmd.group("g").unwrap().members(), [a.id()]);
    }

    #[test]
    fn test_unique_options_sorted_and_deduplicated() {
        let mut cmd = CmdLine::new();
        cmd.add(Opt::<bool>::scalar("z|zeta")).unwrap();
        cmd.add(Opt::<bool>::scalar("a|alpha|al")).unwrap();
        cmd.add(Opt::<String>::scalar("file").positional()).unwrap();
        cmd.add(
            Opt::scalar_with("", 0, crate::MapParser::new([("O0", 0), ("O1", 1)]))
                .arg_name("level"),
        )
        .unwrap();

        // Sorted by the declared name string, so the nameless option is first.
        let names: Vec<_> = cmd
            .unique_options()
            .iter()
            .map(|e| e.display_name().to_string())
            .collect();
        assert_eq!(names, ["level", "a", "z"]);
        assert_eq!(cmd.options().len(), 4);
        assert_eq!(cmd.positionals().count(), 1);
    }

    #[test]
    fn test_prefix_length_tracks_longest_alias() {
        let mut cmd = CmdLine::new();
        cmd.add(Opt::<String>::scalar("O").prefix()).unwrap();
        cmd.add(Opt::<String>::scalar("long-name")).unwrap();
        assert_eq!(cmd.max_prefix_len, 1);
        cmd.add(Opt::<String>::scalar("I|include").may_prefix())
            .unwrap();
        assert_eq!(cmd.max_prefix_len, "include".len());
    }

    #[test]
    fn test_session_bump() {
        let args = vec!["a".to_string(), "b".to_string()];
        let mut s = Session::new(&args);
        assert_eq!(s.bump(), Some("b"));
        assert_eq!(s.index, 1);
        assert_eq!(s.bump(), None);
        assert_eq!(s.index, 1);
    }

    #[test]
    fn test_outcome_into_result() {
        let ok = ParseOutcome {
            errors: Vec::new(),
            unknowns: vec!["-x".into()],
        };
        assert_eq!(ok.into_result().unwrap(), ["-x"]);

        let failed = ParseOutcome {
            errors: vec![ParseError::UnknownOption { token: "-x".into() }],
            unknowns: Vec::new(),
        };
        assert_eq!(failed.into_result().unwrap_err().len(), 1);
    }
}
