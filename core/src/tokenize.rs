//! Shell-style word splitting for response files.
//!
//! Two grammars are supported, selected by [`ResponseFileSyntax`]:
//!
//! - **Unix** ([`tokenize_unix`]): words are separated by whitespace.
//!   `'...'` and `"..."` quote everything up to the matching quote character
//!   (no escapes inside), and a backslash outside quotes takes the next
//!   character literally. Quotes may appear in the middle of a word
//!   (`a"b c"d` is the single word `ab cd`). Empty words, including `''`,
//!   are dropped. An unterminated quote extends to the end of the input.
//! - **Windows** ([`tokenize_windows`]): the `CommandLineToArgvW` rules.
//!   `2n` backslashes followed by `"` produce `n` backslashes and toggle
//!   quoting, `2n + 1` backslashes followed by `"` produce `n` backslashes
//!   and a literal `"`, a `"` directly after a closing quote is literal, and
//!   backslashes not followed by `"` are literal. A quoted empty word (`""`)
//!   is kept.
//!
//! # Examples
//!
//! ```
//! use cmdline_core::tokenize::{tokenize_unix, tokenize_windows};
//!
//! assert_eq!(tokenize_unix(r#"--x 1 --name "a b" it\'s"#), ["--x", "1", "--name", "a b", "it's"]);
//! assert_eq!(tokenize_windows(r#"C:\dir\ "a b" """#), [r"C:\dir\", "a b", ""]);
//! ```

use serde::{Deserialize, Serialize};

/// Grammar used to split response-file contents into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFileSyntax {
    /// POSIX-shell-like quoting (the default).
    #[default]
    Unix,
    /// MSVC runtime quoting.
    Windows,
}

impl ResponseFileSyntax {
    /// Splits `input` using this grammar.
    pub fn tokenize(self, input: &str) -> Vec<String> {
        match self {
            ResponseFileSyntax::Unix => tokenize_unix(input),
            ResponseFileSyntax::Windows => tokenize_windows(input),
        }
    }
}

/// Splits `input` into words using Unix quoting rules.
pub fn tokenize_unix(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    // The active quote character; a backslash quotes exactly one character.
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some('\\') => {
                word.push(ch);
                quote = None;
                continue;
            }
            Some(q) if ch != q => {
                word.push(ch);
                continue;
            }
            _ => {}
        }

        if matches!(ch, '\'' | '"' | '\\') {
            quote = match quote {
                Some(_) => None,
                None => Some(ch),
            };
            continue;
        }

        if ch.is_whitespace() {
            if !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            continue;
        }

        word.push(ch);
    }

    if !word.is_empty() {
        words.push(word);
    }

    words
}

/// Splits `input` into words using Windows (MSVC) quoting rules.
pub fn tokenize_windows(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut backslashes = 0usize;
    let mut quoting = false;
    let mut recently_closed = false;
    // Set once the current word has seen a quote, so `""` yields an empty word.
    let mut quoted_word = false;

    for ch in input.chars() {
        if ch == '"' {
            if recently_closed {
                word.push('"');
                recently_closed = false;
            } else {
                word.extend(std::iter::repeat_n('\\', backslashes / 2));
                if backslashes % 2 == 1 {
                    word.push('"');
                } else {
                    quoting = !quoting;
                    recently_closed = !quoting;
                    quoted_word = true;
                }
                backslashes = 0;
            }
            continue;
        }

        recently_closed = false;

        if ch == '\\' {
            backslashes += 1;
            continue;
        }

        word.extend(std::iter::repeat_n('\\', backslashes));
        backslashes = 0;

        if !quoting && (ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r') {
            if !word.is_empty() || quoted_word {
                words.push(std::mem::take(&mut word));
            }
            quoted_word = false;
        } else {
            word.push(ch);
        }
    }

    word.extend(std::iter::repeat_n('\\', backslashes));

    if quoting || quoted_word || !word.is_empty() {
        words.push(word);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_whitespace() {
        assert_eq!(tokenize_unix("  a\tb\n\nc  "), ["a", "b", "c"]);
        assert!(tokenize_unix("   \n\t").is_empty());
    }

    #[test]
    fn test_unix_quotes() {
        assert_eq!(tokenize_unix(r#""a b" 'c d'"#), ["a b", "c d"]);
        assert_eq!(tokenize_unix(r#"'say "hi"'"#), [r#"say "hi""#]);
        assert_eq!(tokenize_unix(r#""it's""#), ["it's"]);
    }

    #[test]
    fn test_unix_embedded_quotes_join_word() {
        assert_eq!(tokenize_unix(r#"--name="John Smith" x"#), ["--name=John Smith", "x"]);
        assert_eq!(tokenize_unix(r#"a"b c"d"#), ["ab cd"]);
    }

    #[test]
    fn test_unix_backslash() {
        assert_eq!(tokenize_unix(r"a\ b c"), ["a b", "c"]);
        assert_eq!(tokenize_unix(r"\\"), [r"\"]);
        assert_eq!(tokenize_unix(r#"'a\b'"#), [r"a\b"]);
    }

    #[test]
    fn test_unix_empty_quotes_dropped() {
        assert_eq!(tokenize_unix(r#"a '' "" b"#), ["a", "b"]);
    }

    #[test]
    fn test_unix_unterminated_quote() {
        assert_eq!(tokenize_unix(r#"a "b c"#), ["a", "b c"]);
    }

    #[test]
    fn test_windows_basic() {
        assert_eq!(tokenize_windows("a b\tc"), ["a", "b", "c"]);
        assert_eq!(tokenize_windows(r#""a b" c"#), ["a b", "c"]);
    }

    #[test]
    fn test_windows_backslashes() {
        assert_eq!(tokenize_windows(r"a\\b"), [r"a\\b"]);
        assert_eq!(tokenize_windows(r#"a\\"b c""#), [r"a\b c"]);
        assert_eq!(tokenize_windows(r#"a\"b"#), [r#"a"b"#]);
        assert_eq!(tokenize_windows(r#"a\\\"b"#), [r#"a\"b"#]);
        assert_eq!(tokenize_windows(r"trailing\"), [r"trailing\"]);
    }

    #[test]
    fn test_windows_doubled_quote_after_close() {
        assert_eq!(tokenize_windows(r#""a""b""#), [r#"a"b"#]);
    }

    #[test]
    fn test_windows_empty_quoted_word() {
        assert_eq!(tokenize_windows(r#"a "" b"#), ["a", "", "b"]);
        assert_eq!(tokenize_windows(r#"""#), [""]);
    }

    #[test]
    fn test_syntax_dispatch() {
        assert_eq!(ResponseFileSyntax::Unix.tokenize(r"a\ b"), ["a b"]);
        assert_eq!(ResponseFileSyntax::Windows.tokenize(r"a\ b"), [r"a\", "b"]);
    }
}
