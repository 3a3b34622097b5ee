//! Scalar coercion for string-typed fields.
//!
//! YAML renders unquoted `1.10` or `true` as a number or boolean, while every
//! string field in spread.yaml means text (versions, flags passed to
//! scripts). Numbers and booleans are turned into their textual form before
//! any other check runs.

use serde_json::Value;
use std::fmt;

/// JSON type name of a raw value, as used in error messages.
#[must_use]
pub const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// A value that cannot be coerced into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotCoercible {
    /// JSON type of the rejected value.
    pub found: &'static str,
}

impl fmt::Display for NotCoercible {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "expected a string, found {}", self.found)
    }
}

impl std::error::Error for NotCoercible {}

/// Coerce a scalar into its canonical string form.
///
/// Strings pass through unchanged; numbers and booleans are rendered;
/// null, lists, and mappings are rejected.
pub fn coerce_string(value: &Value) -> Result<String, NotCoercible> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(NotCoercible {
            found: type_name(value),
        }),
    }
}

/// Integer value of a JSON number, accepting integral floats such as `3.0`.
///
/// Returns `None` for non-numbers, fractional numbers, and values outside
/// the `i64` range.
#[must_use]
pub fn integral(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let float = value.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    #[allow(clippy::cast_precision_loss, reason = "bounds are powers of two")]
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    if !float.is_finite() || float.fract() != 0.0 || !in_range {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, reason = "integral and range checked above")]
    let number = float as i64;
    Some(number)
}
