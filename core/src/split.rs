//! Lazy, delimiter-driven string splitting.
//!
//! [`split`] yields borrowed substrings of its input one at a time. The
//! [`Delimiter`] decides where a piece ends and the [`Filter`] decides which
//! pieces are kept (and whether they are trimmed first).
//!
//! # Examples
//!
//! ```
//! use cmdline_core::split::{Delimiter, Filter, split};
//!
//! let pieces: Vec<_> = split("a,,b", Delimiter::Literal(","), Filter::KeepEmpty).collect();
//! assert_eq!(pieces, ["a", "", "b"]);
//!
//! let pieces: Vec<_> = split(" x ; y ;", Delimiter::AnyOf(";"), Filter::Trim).collect();
//! assert_eq!(pieces, ["x", "y"]);
//! ```

use std::iter::FusedIterator;

/// Where a piece ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter<'d> {
    /// Split at every occurrence of the whole substring. An empty needle
    /// never matches, so the input comes back as a single piece.
    Literal(&'d str),
    /// Split at every character contained in the set.
    AnyOf(&'d str),
}

impl Delimiter<'_> {
    /// Returns the byte offset and byte length of the next delimiter in `s`.
    fn find(&self, s: &str) -> Option<(usize, usize)> {
        match *self {
            Delimiter::Literal("") => None,
            Delimiter::Literal(needle) => s.find(needle).map(|pos| (pos, needle.len())),
            Delimiter::AnyOf(set) => s
                .char_indices()
                .find(|(_, c)| set.contains(*c))
                .map(|(pos, c)| (pos, c.len_utf8())),
        }
    }
}

/// Which pieces are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Every piece, including empty ones.
    #[default]
    KeepEmpty,
    /// Drop empty pieces.
    SkipEmpty,
    /// Drop pieces that are empty or whitespace-only.
    SkipSpace,
    /// Trim surrounding whitespace, then drop empty pieces.
    Trim,
}

impl Filter {
    fn apply<'a>(self, piece: &'a str) -> Option<&'a str> {
        match self {
            Filter::KeepEmpty => Some(piece),
            Filter::SkipEmpty => (!piece.is_empty()).then_some(piece),
            Filter::SkipSpace => (!piece.trim().is_empty()).then_some(piece),
            Filter::Trim => {
                let trimmed = piece.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
        }
    }
}

/// Iterator returned by [`split`].
#[derive(Debug, Clone)]
pub struct Split<'a, 'd> {
    rest: Option<&'a str>,
    delimiter: Delimiter<'d>,
    filter: Filter,
}

impl<'a> Split<'a, '_> {
    /// The part of the input that has not been consumed yet.
    pub fn remainder(&self) -> Option<&'a str> {
        self.rest
    }
}

impl<'a> Iterator for Split<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let s = self.rest?;
            let piece = match self.delimiter.find(s) {
                Some((pos, len)) => {
                    self.rest = Some(&s[pos + len..]);
                    &s[..pos]
                }
                None => {
                    self.rest = None;
                    s
                }
            };
            if let Some(piece) = self.filter.apply(piece) {
                return Some(piece);
            }
        }
    }
}

impl FusedIterator for Split<'_, '_> {}

/// Splits `input` lazily.
///
/// An empty input produces a single empty piece under [`Filter::KeepEmpty`].
pub fn split<'a, 'd>(input: &'a str, delimiter: Delimiter<'d>, filter: Filter) -> Split<'a, 'd> {
    Split {
        rest: Some(input),
        delimiter,
        filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<'a>(input: &'a str, delimiter: Delimiter<'_>, filter: Filter) -> Vec<&'a str> {
        split(input, delimiter, filter).collect()
    }

    #[test]
    fn test_literal_keeps_empty_pieces() {
        assert_eq!(
            collect(",a,,b,", Delimiter::Literal(","), Filter::KeepEmpty),
            ["", "a", "", "b", ""]
        );
    }

    #[test]
    fn test_empty_input_yields_one_piece() {
        assert_eq!(collect("", Delimiter::Literal(","), Filter::KeepEmpty), [""]);
        assert!(collect("", Delimiter::Literal(","), Filter::SkipEmpty).is_empty());
    }

    #[test]
    fn test_multi_char_literal() {
        assert_eq!(
            collect("a::b:c", Delimiter::Literal("::"), Filter::KeepEmpty),
            ["a", "b:c"]
        );
    }

    #[test]
    fn test_empty_literal_returns_whole_input() {
        assert_eq!(collect("abc", Delimiter::Literal(""), Filter::KeepEmpty), ["abc"]);
    }

    #[test]
    fn test_any_of() {
        assert_eq!(
            collect("a b\tc", Delimiter::AnyOf(" \t"), Filter::KeepEmpty),
            ["a", "b", "c"]
        );
        assert_eq!(
            collect("x||y", Delimiter::AnyOf("|"), Filter::SkipEmpty),
            ["x", "y"]
        );
    }

    #[test]
    fn test_any_of_multibyte_delimiter() {
        assert_eq!(
            collect("a→b→c", Delimiter::AnyOf("→"), Filter::KeepEmpty),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_skip_space_and_trim() {
        assert_eq!(
            collect(" a , ,b ", Delimiter::Literal(","), Filter::SkipSpace),
            [" a ", "b "]
        );
        assert_eq!(
            collect(" a , ,b ", Delimiter::Literal(","), Filter::Trim),
            ["a", "b"]
        );
    }

    #[test]
    fn test_remainder_tracks_progress() {
        let mut it = split("a=b=c", Delimiter::Literal("="), Filter::KeepEmpty);
        assert_eq!(it.next(), Some("a"));
        assert_eq!(it.remainder(), Some("b=c"));
        assert_eq!(it.next(), Some("b"));
        assert_eq!(it.next(), Some("c"));
        assert_eq!(it.remainder(), None);
        assert_eq!(it.next(), None);
    }
}
