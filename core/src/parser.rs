//! Value parsers: turning the text of an argument into a typed value.
//!
//! The engine never interprets values itself. Every option carries a
//! [`ValueParser`] that receives the alias the option was matched by and the
//! raw text, and either produces a value or explains why the text was
//! rejected.
//!
//! - [`Parser<T>`] is the default for any [`Value`] type (strings, paths,
//!   booleans, characters, integers and floats).
//! - [`MapParser<T>`] accepts a fixed set of spellings. Its keys double as
//!   aliases for options declared without a name.
//! - Any `Fn(&str, &str) -> Result<T, String>` closure is a parser too.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Converts raw argument text into a `T`.
pub trait ValueParser<T> {
    /// Parses `raw`, which was given for the option matched as `name`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `raw` is not acceptable.
    fn parse(&self, name: &str, raw: &str) -> Result<T, String>;

    /// The enumerated spellings this parser accepts, if it has a closed set.
    fn allowed_values(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<T, F> ValueParser<T> for F
where
    F: Fn(&str, &str) -> Result<T, String>,
{
    fn parse(&self, name: &str, raw: &str) -> Result<T, String> {
        self(name, raw)
    }
}

/// Types with a canonical textual form on the command line.
pub trait Value: Sized + 'static {
    /// Parses the textual form.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `raw` is not a valid `Self`.
    fn parse_value(raw: &str) -> Result<Self, String>;
}

impl Value for String {
    fn parse_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl Value for PathBuf {
    fn parse_value(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

/// A flag given without a value counts as `true`.
impl Value for bool {
    fn parse_value(raw: &str) -> Result<Self, String> {
        match raw {
            "" | "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(format!("'{raw}' is not a boolean (expected true, false, 1 or 0)")),
        }
    }
}

impl Value for char {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("'{raw}' is not a single character")),
        }
    }
}

/// Splits an integer literal into sign, radix and digits.
///
/// Accepts an optional sign followed by `0x`/`0X` (hex), `0b`/`0B` (binary),
/// a leading `0` (octal) or plain decimal digits.
fn split_integer(raw: &str) -> (bool, u32, &str) {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (negative, 16, hex)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (negative, 2, bin)
    } else if body.len() > 1 && body.starts_with('0') {
        (negative, 8, &body[1..])
    } else {
        (negative, 10, body)
    }
}

fn parse_integer(raw: &str) -> Result<i128, String> {
    let (negative, radix, digits) = split_integer(raw);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(format!("'{raw}' is not an integer"));
    }
    let magnitude = i128::from_str_radix(digits, radix)
        .map_err(|e| format!("'{raw}' is not an integer: {e}"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

macro_rules! impl_integer_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Value for $ty {
                fn parse_value(raw: &str) -> Result<Self, String> {
                    let wide = parse_integer(raw)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| format!("'{raw}' is out of range for {}", stringify!($ty)))
                }
            }
        )*
    };
}

impl_integer_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Value for $ty {
                fn parse_value(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>()
                        .map_err(|e| format!("'{raw}' is not a number: {e}"))
                }
            }
        )*
    };
}

impl_float_value!(f32, f64);

/// The default parser for a [`Value`] type.
///
/// # Examples
///
/// ```
/// use cmdline_core::parser::{Parser, ValueParser};
///
/// assert_eq!(Parser::<i32>::new().parse("n", "0x1f"), Ok(31));
/// assert_eq!(Parser::<i32>::new().parse("n", "-010"), Ok(-8));
/// assert!(Parser::<u8>::new().parse("n", "256").is_err());
/// assert_eq!(Parser::<bool>::new().parse("v", ""), Ok(true));
/// ```
pub struct Parser<T>(PhantomData<fn() -> T>);

impl<T> Parser<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Parser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Parser")
    }
}

impl<T: Value> ValueParser<T> for Parser<T> {
    fn parse(&self, _name: &str, raw: &str) -> Result<T, String> {
        T::parse_value(raw)
    }
}

/// Accepts one of a fixed set of spellings.
///
/// An empty value is looked up by the alias the option was matched as. This
/// lets an option declared without a name expose its keys as aliases: with
/// keys `O0`..`O3`, the argument `-O2` matches alias `O2` with no value and
/// resolves to the value stored under `O2`.
///
/// # Examples
///
/// ```
/// use cmdline_core::parser::{MapParser, ValueParser};
///
/// let lang = MapParser::new([("none", 0), ("c", 1), ("c++", 2)]);
/// assert_eq!(lang.parse("x", "c++"), Ok(2));
/// assert_eq!(lang.parse("c", ""), Ok(1));
/// assert!(lang.parse("x", "cxx").is_err());
/// assert_eq!(lang.allowed_values(), ["c", "c++", "none"]);
/// ```
#[derive(Debug, Clone)]
pub struct MapParser<T> {
    values: BTreeMap<String, T>,
}

impl<T> MapParser<T> {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self {
            values: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Adds or replaces one spelling.
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Clone> ValueParser<T> for MapParser<T> {
    fn parse(&self, name: &str, raw: &str) -> Result<T, String> {
        let key = if raw.is_empty() { name } else { raw };
        self.values.get(key).cloned().ok_or_else(|| {
            let expected = self.values.keys().map(String::as_str).collect::<Vec<_>>();
            format!("'{key}' is not one of: {}", expected.join(", "))
        })
    }

    fn allowed_values(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}
