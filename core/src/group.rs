//! Option groups: cardinality rules across several options.
//!
//! A group only refers to its members; the options stay owned by the
//! [`CmdLine`](crate::CmdLine). After dispatch, every group whose constraint
//! is not [`GroupConstraint::Default`] counts how many members occurred at
//! least once and compares that number against the rule.
//!
//! # Examples
//!
//! ```
//! use cmdline_core::{CmdLine, GroupConstraint, Opt, OptionGroup};
//!
//! let mut cmd = CmdLine::new();
//! let json = cmd.add(Opt::<bool>::scalar("json")).unwrap();
//! let yaml = cmd.add(Opt::<bool>::scalar("yaml")).unwrap();
//! cmd.add_group(OptionGroup::new("format", GroupConstraint::One).with(&json).with(&yaml))
//!     .unwrap();
//!
//! assert!(cmd.parse(["--json"]).is_success());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::options::{Handle, OptionEntry, OptionId};

/// How many members of a group may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupConstraint {
    /// No constraint; the group is only a grouping.
    #[default]
    Default,
    /// None of the members may occur.
    Zero,
    /// At most one member may occur.
    ZeroOrOne,
    /// Exactly one member must occur.
    One,
    /// At least one member must occur.
    OneOrMore,
    /// Every member must occur.
    All,
    /// Either no member or every member must occur.
    ZeroOrAll,
}

impl GroupConstraint {
    /// Whether `specified` members out of `total` satisfy the rule.
    pub fn admits(self, specified: usize, total: usize) -> bool {
        match self {
            GroupConstraint::Default => true,
            GroupConstraint::Zero => specified == 0,
            GroupConstraint::ZeroOrOne => specified <= 1,
            GroupConstraint::One => specified == 1,
            GroupConstraint::OneOrMore => specified >= 1,
            GroupConstraint::All => specified == total,
            GroupConstraint::ZeroOrAll => specified == 0 || specified == total,
        }
    }

    /// The rule phrased for error messages.
    pub fn requirement(self) -> &'static str {
        match self {
            GroupConstraint::Default => "any number of options may be specified",
            GroupConstraint::Zero => "no option may be specified",
            GroupConstraint::ZeroOrOne => "at most one option may be specified",
            GroupConstraint::One => "exactly one option must be specified",
            GroupConstraint::OneOrMore => "at least one option must be specified",
            GroupConstraint::All => "all options must be specified",
            GroupConstraint::ZeroOrAll => "none or all options must be specified",
        }
    }
}

impl fmt::Display for GroupConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupConstraint::Default => "default",
            GroupConstraint::Zero => "zero",
            GroupConstraint::ZeroOrOne => "zero_or_one",
            GroupConstraint::One => "one",
            GroupConstraint::OneOrMore => "one_or_more",
            GroupConstraint::All => "all",
            GroupConstraint::ZeroOrAll => "zero_or_all",
        };
        f.write_str(name)
    }
}

/// A named set of options sharing a [`GroupConstraint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    name: String,
    constraint: GroupConstraint,
    members: Vec<OptionId>,
}

impl OptionGroup {
    pub fn new(name: impl Into<String>, constraint: GroupConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
            members: Vec::new(),
        }
    }

    /// Adds a member; adding the same option twice has no effect.
    pub fn add(&mut self, id: OptionId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    /// Builder form of [`add`](Self::add) taking a typed handle.
    pub fn with<C>(mut self, handle: &Handle<C>) -> Self {
        self.add(handle.id());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> GroupConstraint {
        self.constraint
    }

    pub fn members(&self) -> &[OptionId] {
        &self.members
    }

    /// Checks the constraint against the occurrence counts in `entries`.
    pub(crate) fn check(&self, entries: &[OptionEntry]) -> Result<(), ParseError> {
        if self.constraint == GroupConstraint::Default {
            return Ok(());
        }

        let specified = self
            .members
            .iter()
            .filter(|id| entries.get(id.index()).is_some_and(|e| e.count() > 0))
            .count();

        tracing::debug!(
            group = %self.name,
            constraint = %self.constraint,
            specified,
            total = self.members.len(),
            "Checking option group"
        );

        if self.constraint.admits(specified, self.members.len()) {
            Ok(())
        } else {
            Err(ParseError::GroupConstraintViolated {
                group: self.name.clone(),
                constraint: self.constraint,
                count: specified,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_table() {
        use GroupConstraint::{All, One, OneOrMore, Zero, ZeroOrAll, ZeroOrOne};

        // (constraint, [admits 0, 1, 2, 3] of 3 members)
        let table = [
            (GroupConstraint::Default, [true, true, true, true]),
            (Zero, [true, false, false, false]),
            (ZeroOrOne, [true, true, false, false]),
            (One, [false, true, false, false]),
            (OneOrMore, [false, true, true, true]),
            (All, [false, false, false, true]),
            (ZeroOrAll, [true, false, false, true]),
        ];

        for (constraint, expected) in table {
            for (specified, want) in expected.into_iter().enumerate() {
                assert_eq!(
                    constraint.admits(specified, 3),
                    want,
                    "{constraint} with {specified} of 3"
                );
            }
        }
    }

    #[test]
    fn test_members_are_deduplicated() {
        let mut group = OptionGroup::new("g", GroupConstraint::All);
        group.add(OptionId(1));
        group.add(OptionId(0));
        group.add(OptionId(1));
        assert_eq!(group.members(), [OptionId(1), OptionId(0)]);
    }

    #[test]
    fn test_empty_all_group_is_satisfied() {
        let group = OptionGroup::new("g", GroupConstraint::All);
        assert!(group.check(&[]).is_ok());
    }
}
