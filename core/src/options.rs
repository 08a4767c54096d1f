//! Option declarations.
//!
//! An option is declared with the [`Opt`] builder and handed to
//! [`CmdLine::add`](crate::CmdLine::add), which returns a typed [`Handle`]
//! for reading the value back after parsing.
//!
//! Storage is fixed at declaration time and is one of two kinds
//! ([`StorageKind`]):
//!
//! - **Scalar** ([`Opt::scalar`], [`Opt::scalar_with`]): every occurrence
//!   overwrites the held value.
//! - **Container** ([`Opt::list`], [`Opt::collection`],
//!   [`Opt::container_with`]): every occurrence is appended through an insert
//!   function.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//! use cmdline_core::{Opt, StorageKind};
//!
//! let verbose = Opt::<bool>::scalar("v|verbose").grouping().desc("Print more");
//! assert_eq!(verbose.info().storage, StorageKind::Scalar);
//!
//! let include = Opt::<Vec<String>>::list("I").prefix().arg_name("dir");
//! assert_eq!(include.info().storage, StorageKind::Container);
//!
//! let ids = Opt::<BTreeSet<u32>>::collection("ids").comma_separated();
//! assert!(ids.info().flags.contains(cmdline_core::MiscFlags::COMMA_SEPARATED));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::parser::{Parser, Value, ValueParser};

/// How often an option may (or must) occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrence {
    /// Zero or one occurrence.
    #[default]
    Optional,
    /// Any number of occurrences.
    ZeroOrMore,
    /// Exactly one occurrence.
    Required,
    /// At least one occurrence.
    OneOrMore,
}

/// Whether an option takes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgRequirement {
    /// A value may be attached inline (`-o=x`) but is never taken from the
    /// next token.
    #[default]
    Optional,
    /// A value must be given, inline or as the next token.
    Required,
    /// No value may be given.
    Disallowed,
}

/// How an option and its value are spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatting {
    /// `-name`, `-name=value` or `-name value`.
    #[default]
    Default,
    /// `-Nvalue` only; the value never comes from the next token.
    Prefix,
    /// Like `Prefix`, but `-N value` is accepted as well.
    MayPrefix,
    /// Single-character flags that may be clustered (`-abc`).
    Grouping,
    /// Matched by position instead of by name.
    Positional,
}

/// Extra behaviour switches.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiscFlags(u8);

impl MiscFlags {
    pub const NONE: MiscFlags = MiscFlags(0);
    /// Split each value on `,` and store the pieces separately.
    pub const COMMA_SEPARATED: MiscFlags = MiscFlags(0x01);
    /// Once this positional option receives a value, every following token
    /// is treated as positional.
    pub const CONSUME_AFTER: MiscFlags = MiscFlags(0x02);
    /// Leave the option out of listings.
    pub const HIDDEN: MiscFlags = MiscFlags(0x04);

    pub fn contains(self, other: MiscFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MiscFlags) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MiscFlags {
    type Output = MiscFlags;

    fn bitor(self, rhs: MiscFlags) -> MiscFlags {
        MiscFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MiscFlags {
    fn bitor_assign(&mut self, rhs: MiscFlags) {
        self.insert(rhs);
    }
}

impl fmt::Debug for MiscFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (MiscFlags::COMMA_SEPARATED, "COMMA_SEPARATED"),
            (MiscFlags::CONSUME_AFTER, "CONSUME_AFTER"),
            (MiscFlags::HIDDEN, "HIDDEN"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&set.join(" | "))
        }
    }
}

/// Scalar (overwrite) or container (append) storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Scalar,
    Container,
}

/// The declared, immutable description of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    /// Pipe-separated aliases (`"o|output"`), or empty for an option whose
    /// enumerated values serve as aliases.
    pub name: String,
    /// Label for the value in messages (defaults to `"arg"`).
    pub arg_name: String,
    pub desc: String,
    pub occurrence: Occurrence,
    pub arg: ArgRequirement,
    pub formatting: Formatting,
    pub flags: MiscFlags,
    pub storage: StorageKind,
}

/// Identifies a registered option within one [`CmdLine`](crate::CmdLine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OptionId(pub(crate) usize);

impl OptionId {
    /// Position of the option in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Typed reference to a registered option, returned by
/// [`CmdLine::add`](crate::CmdLine::add).
pub struct Handle<C> {
    id: OptionId,
    marker: PhantomData<fn() -> C>,
}

impl<C> Handle<C> {
    pub(crate) fn new(id: OptionId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    pub fn id(&self) -> OptionId {
        self.id
    }
}

impl<C> Clone for Handle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handle<C> {}

impl<C> fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.id.0).finish()
    }
}

/// Type-erased storage slot: parses a piece of text and writes it.
pub(crate) trait Store {
    fn store(&mut self, name: &str, raw: &str) -> Result<(), String>;
    fn allowed_values(&self) -> Vec<String>;
    fn value(&self) -> &dyn Any;
    fn value_mut(&mut self) -> &mut dyn Any;
}

/// Holds the current value `C` and writes parsed `T`s into it with `write`,
/// which is chosen once from the storage kind.
struct Slot<C, T> {
    value: C,
    parser: Box<dyn ValueParser<T>>,
    write: fn(&mut C, T),
}

impl<C: 'static, T: 'static> Store for Slot<C, T> {
    fn store(&mut self, name: &str, raw: &str) -> Result<(), String> {
        let parsed = self.parser.parse(name, raw)?;
        (self.write)(&mut self.value, parsed);
        Ok(())
    }

    fn allowed_values(&self) -> Vec<String> {
        self.parser.allowed_values()
    }

    fn value(&self) -> &dyn Any {
        &self.value
    }

    fn value_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

fn overwrite<T>(slot: &mut T, value: T) {
    *slot = value;
}

fn append<C: Extend<T>, T>(slot: &mut C, value: T) {
    slot.extend(std::iter::once(value));
}

/// Declaration builder for an option whose stored value has type `C`.
pub struct Opt<C> {
    pub(crate) info: OptionInfo,
    pub(crate) store: Box<dyn Store>,
    marker: PhantomData<fn() -> C>,
}

impl<C: 'static> Opt<C> {
    fn build<T: 'static>(
        name: String,
        storage: StorageKind,
        init: C,
        parser: Box<dyn ValueParser<T>>,
        write: fn(&mut C, T),
    ) -> Self {
        let occurrence = match storage {
            StorageKind::Scalar => Occurrence::Optional,
            StorageKind::Container => Occurrence::ZeroOrMore,
        };
        Self {
            info: OptionInfo {
                name,
                arg_name: "arg".to_string(),
                desc: String::new(),
                occurrence,
                arg: ArgRequirement::Optional,
                formatting: Formatting::Default,
                flags: MiscFlags::NONE,
                storage,
            },
            store: Box::new(Slot {
                value: init,
                parser,
                write,
            }),
            marker: PhantomData,
        }
    }

    /// A scalar option with an explicit initial value and parser.
    pub fn scalar_with(
        name: impl Into<String>,
        init: C,
        parser: impl ValueParser<C> + 'static,
    ) -> Self {
        Self::build(
            name.into(),
            StorageKind::Scalar,
            init,
            Box::new(parser),
            overwrite::<C>,
        )
    }

    /// A container option with an explicit initial value, element parser and
    /// insert function.
    pub fn container_with<T: 'static>(
        name: impl Into<String>,
        init: C,
        parser: impl ValueParser<T> + 'static,
        insert: fn(&mut C, T),
    ) -> Self {
        Self::build(
            name.into(),
            StorageKind::Container,
            init,
            Box::new(parser),
            insert,
        )
    }

    /// A container option for any default-constructible collection whose
    /// elements are [`Value`]s.
    pub fn collection(name: impl Into<String>) -> Self
    where
        C: Default + IntoIterator + Extend<<C as IntoIterator>::Item>,
        <C as IntoIterator>::Item: Value,
    {
        Self::container_with(
            name,
            C::default(),
            Parser::<<C as IntoIterator>::Item>::new(),
            append::<C, <C as IntoIterator>::Item>,
        )
    }

    pub fn info(&self) -> &OptionInfo {
        &self.info
    }

    /// Label for the value in messages.
    pub fn arg_name(mut self, arg_name: impl Into<String>) -> Self {
        self.info.arg_name = arg_name.into();
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.info.desc = desc.into();
        self
    }

    pub fn occurrence(mut self, occurrence: Occurrence) -> Self {
        self.info.occurrence = occurrence;
        self
    }

    pub fn optional(self) -> Self {
        self.occurrence(Occurrence::Optional)
    }

    pub fn zero_or_more(self) -> Self {
        self.occurrence(Occurrence::ZeroOrMore)
    }

    pub fn required(self) -> Self {
        self.occurrence(Occurrence::Required)
    }

    pub fn one_or_more(self) -> Self {
        self.occurrence(Occurrence::OneOrMore)
    }

    pub fn arg(mut self, arg: ArgRequirement) -> Self {
        self.info.arg = arg;
        self
    }

    pub fn arg_optional(self) -> Self {
        self.arg(ArgRequirement::Optional)
    }

    pub fn arg_required(self) -> Self {
        self.arg(ArgRequirement::Required)
    }

    pub fn arg_disallowed(self) -> Self {
        self.arg(ArgRequirement::Disallowed)
    }

    pub fn formatting(mut self, formatting: Formatting) -> Self {
        self.info.formatting = formatting;
        self
    }

    pub fn prefix(self) -> Self {
        self.formatting(Formatting::Prefix)
    }

    pub fn may_prefix(self) -> Self {
        self.formatting(Formatting::MayPrefix)
    }

    pub fn grouping(self) -> Self {
        self.formatting(Formatting::Grouping)
    }

    pub fn positional(self) -> Self {
        self.formatting(Formatting::Positional)
    }

    pub fn flags(mut self, flags: MiscFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    pub fn comma_separated(self) -> Self {
        self.flags(MiscFlags::COMMA_SEPARATED)
    }

    pub fn consume_after(self) -> Self {
        self.flags(MiscFlags::CONSUME_AFTER)
    }

    pub fn hidden(self) -> Self {
        self.flags(MiscFlags::HIDDEN)
    }
}

impl<T: Value + Default> Opt<T> {
    /// A scalar option starting at `T::default()` with the default parser.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::scalar_with(name, T::default(), Parser::<T>::new())
    }
}

impl<T: Value> Opt<Vec<T>> {
    /// A `Vec` option with the default element parser.
    pub fn list(name: impl Into<String>) -> Self {
        Self::collection(name)
    }
}

impl<C> fmt::Debug for Opt<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt").field("info", &self.info).finish()
    }
}

/// A registered option: its declaration, occurrence count and value.
pub struct OptionEntry {
    info: OptionInfo,
    count: u32,
    store: Box<dyn Store>,
}

impl OptionEntry {
    pub(crate) fn new(mut info: OptionInfo, store: Box<dyn Store>) -> Self {
        // Clustered flags cannot carry an optional inline value.
        if info.formatting == Formatting::Grouping && info.arg == ArgRequirement::Optional {
            info.arg = ArgRequirement::Disallowed;
        }
        Self {
            info,
            count: 0,
            store,
        }
    }

    pub fn info(&self) -> &OptionInfo {
        &self.info
    }

    /// Number of values stored so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The aliases this option answers to, in declaration order. Options
    /// without a name answer to their enumerated values.
    pub fn aliases(&self) -> Vec<String> {
        if self.info.name.is_empty() {
            self.store.allowed_values()
        } else {
            crate::split::split(
                &self.info.name,
                crate::split::Delimiter::Literal("|"),
                crate::split::Filter::SkipEmpty,
            )
            .map(String::from)
            .collect()
        }
    }

    /// The first alias, or the argument label for an option without a name.
    pub fn display_name(&self) -> &str {
        match self.info.name.split('|').find(|s| !s.is_empty()) {
            Some(alias) => alias,
            None => self.info.arg_name.as_str(),
        }
    }

    pub fn is_occurrence_allowed(&self) -> bool {
        match self.info.occurrence {
            Occurrence::Optional | Occurrence::Required => self.count == 0,
            Occurrence::ZeroOrMore | Occurrence::OneOrMore => true,
        }
    }

    pub fn is_occurrence_required(&self) -> bool {
        self.is_required() && self.count == 0
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(
            self.info.occurrence,
            Occurrence::ZeroOrMore | Occurrence::OneOrMore
        )
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self.info.occurrence,
            Occurrence::Required | Occurrence::OneOrMore
        )
    }

    pub fn is_prefix(&self) -> bool {
        matches!(
            self.info.formatting,
            Formatting::Prefix | Formatting::MayPrefix
        )
    }

    pub fn is_hidden(&self) -> bool {
        self.info.flags.contains(MiscFlags::HIDDEN)
    }

    /// Parses and stores one value, counting it on success.
    pub(crate) fn store_piece(&mut self, name: &str, raw: &str) -> Result<(), String> {
        self.store.store(name, raw)?;
        self.count += 1;
        Ok(())
    }

    pub(crate) fn value(&self) -> &dyn Any {
        self.store.value()
    }

    pub(crate) fn value_mut(&mut self) -> &mut dyn Any {
        self.store.value_mut()
    }
}

impl fmt::Debug for OptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionEntry")
            .field("info", &self.info)
            .field("count", &self.count)
            .finish()
    }
}
