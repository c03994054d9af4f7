#![forbid(unsafe_code)]

//! Dynamic field values and the loose coercions bindings rely on.
//!
//! Record fields are untyped: a binding may render a number into a text
//! node, read a string back out of an input and have to turn it into a
//! number again. [`Value`] carries the handful of scalar shapes a record
//! field can hold, and implements the conversions the expression
//! interpreter and the renderer need.
//!
//! # Coercion table
//!
//! | Value       | truthy        | `to_number()`        | `to_display_string()` |
//! |-------------|---------------|----------------------|-----------------------|
//! | `Undefined` | false         | NaN                  | `"undefined"`         |
//! | `Null`      | false         | 0                    | `"null"`              |
//! | `Bool(b)`   | b             | 1 / 0                | `"true"` / `"false"`  |
//! | `Number(n)` | n ≠ 0, not NaN| n                    | integral → no `.0`    |
//! | `String(s)` | non-empty     | trimmed parse or NaN | s                     |

use std::cmp::Ordering;
use std::fmt;

/// A scalar record field value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Field is absent.
    #[default]
    Undefined,
    /// Field is explicitly empty.
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Runtime type tag of a [`Value`], used when coercing UI input back into
/// the type a field already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Undefined,
    Null,
    Bool,
    Number,
    String,
}

impl Value {
    /// Runtime type of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Undefined,
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
        }
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Boolean interpretation of the value.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
        }
    }

    /// Numeric interpretation of the value.
    ///
    /// Strings are trimmed and parsed whole; an empty string is 0 and
    /// anything unparsable is NaN.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    parse_number_literal(trimmed).unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Truncating 32-bit integer interpretation, used by the bitwise
    /// operators.
    #[must_use]
    pub fn to_int32(&self) -> i32 {
        let n = self.to_number();
        if !n.is_finite() {
            return 0;
        }
        // Wrap modulo 2^32 like the scripting semantics the operators mirror.
        let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
        (wrapped as u32) as i32
    }

    /// String form used for text content, attribute values and template
    /// concatenation.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
        }
    }

    /// Display string, with `Undefined` rendered as the empty string.
    #[must_use]
    pub fn to_display_or_empty(&self) -> String {
        match self {
            Self::Undefined => String::new(),
            other => other.to_display_string(),
        }
    }

    /// Strict equality: same type and same value. NaN is never equal to
    /// itself.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// Loose equality: `null` and `undefined` equal each other, mixed
    /// primitive types compare numerically.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined | Self::Null, Self::Undefined | Self::Null) => true,
            (Self::Undefined | Self::Null, _) | (_, Self::Undefined | Self::Null) => false,
            (Self::String(a), Self::String(b)) => a == b,
            (a, b) if a.kind() == b.kind() => a.strict_eq(b),
            (a, b) => a.to_number() == b.to_number(),
        }
    }

    /// Relational comparison. Two strings compare lexicographically,
    /// anything else numerically. `None` when either side is NaN.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (a, b) => a.to_number().partial_cmp(&b.to_number()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Parse the longest leading decimal prefix of `input`.
///
/// Leading whitespace is skipped; `"42px"` yields 42, `"  -1.5e3x"` yields
/// -1500 and input without a numeric prefix yields NaN.
#[must_use]
pub fn parse_float_prefix(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let rest = &s[end..];
    if rest.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_number_literal(s: &str) -> Option<f64> {
    match s {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("inf") => None,
        _ => s.parse::<f64>().ok(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
        assert!(Value::from(-1).truthy());
        assert!(Value::from(true).truthy());
    }

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(Value::from(42).to_display_string(), "42");
        assert_eq!(Value::Number(1.5).to_display_string(), "1.5");
        assert_eq!(Value::Number(-0.0).to_display_string(), "0");
        assert_eq!(Value::Number(f64::NAN).to_display_string(), "NaN");
        assert_eq!(Value::Number(f64::INFINITY).to_display_string(), "Infinity");
    }

    #[test]
    fn undefined_display_or_empty() {
        assert_eq!(Value::Undefined.to_display_or_empty(), "");
        assert_eq!(Value::Null.to_display_or_empty(), "null");
    }

    #[test]
    fn string_to_number() {
        assert_eq!(Value::from(" 12 ").to_number(), 12.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert!(Value::from("12px").to_number().is_nan());
        assert!(Value::from("nan").to_number().is_nan());
    }

    #[test]
    fn float_prefix_parsing() {
        assert_eq!(parse_float_prefix("42"), 42.0);
        assert_eq!(parse_float_prefix("42px"), 42.0);
        assert_eq!(parse_float_prefix("  -1.5e3x"), -1500.0);
        assert_eq!(parse_float_prefix(".5"), 0.5);
        assert_eq!(parse_float_prefix("3e"), 3.0);
        assert_eq!(parse_float_prefix("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix(".").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::from(1).loose_eq(&Value::from("1")));
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::from(0)));
        assert!(!Value::from("a").loose_eq(&Value::from("b")));
    }

    #[test]
    fn strict_equality() {
        assert!(!Value::from(1).strict_eq(&Value::from("1")));
        assert!(Value::from("x").strict_eq(&Value::from("x")));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
    }

    #[test]
    fn comparison() {
        assert_eq!(
            Value::from("10").compare(&Value::from("9")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from(10).compare(&Value::from("9")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Undefined.compare(&Value::from(1)), None);
    }

    #[test]
    fn int32_wraps() {
        assert_eq!(Value::from(5).to_int32(), 5);
        assert_eq!(Value::Number(-1.7).to_int32(), -1);
        assert_eq!(Value::Number(4_294_967_297.0).to_int32(), 1);
        assert_eq!(Value::Undefined.to_int32(), 0);
    }
}
