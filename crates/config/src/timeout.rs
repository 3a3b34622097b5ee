//! Timeout duration syntax.
//!
//! Timeouts are written as one or more `<decimal><unit>` components
//! (`30s`, `1m30s`, `1.5h`), `0`, or the sentinel `-1` that disables the
//! timeout altogether.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Schema pattern equivalent to [`Timeout::parse`].
pub const TIMEOUT_PATTERN: &str = r"^(-1|0|(([0-9]+(\.[0-9]*)?|\.[0-9]+)(ns|us|µs|ms|s|m|h))+)$";

const DISABLED: &str = "-1";

// Longer suffixes first so `ms` is not read as `m` followed by garbage.
const UNITS: [(&str, f64); 7] = [
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("ms", 1e6),
    ("h", 3.6e12),
    ("m", 6e10),
    ("s", 1e9),
];

/// A parsed timeout value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// `-1`: never time out.
    Disabled,
    /// Time out after the given duration.
    After(Duration),
}

/// A string that is not valid timeout syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimeout {
    value: String,
}

impl InvalidTimeout {
    /// The rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for InvalidTimeout {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "invalid timeout `{}`: expected -1, 0, or a duration such as 30s or 1m30s",
            self.value
        )
    }
}

impl std::error::Error for InvalidTimeout {}

impl Timeout {
    /// Parse timeout syntax.
    pub fn parse(text: &str) -> Result<Self, InvalidTimeout> {
        let invalid = || InvalidTimeout {
            value: text.to_string(),
        };
        if text == DISABLED {
            return Ok(Self::Disabled);
        }
        if text == "0" {
            return Ok(Self::After(Duration::ZERO));
        }
        if text.is_empty() {
            return Err(invalid());
        }

        let mut rest = text;
        let mut nanos = 0.0_f64;
        while !rest.is_empty() {
            let (amount, after_number) = split_decimal(rest).ok_or_else(invalid)?;
            let (scale, after_unit) = split_unit(after_number).ok_or_else(invalid)?;
            nanos += amount * scale;
            rest = after_unit;
        }

        duration_from_nanos(nanos).map(Self::After).ok_or_else(invalid)
    }

    /// The duration, or `None` when disabled.
    #[must_use]
    pub const fn duration(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::After(duration) => Some(duration),
        }
    }

    /// Returns true for the `-1` sentinel.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl FromStr for Timeout {
    type Err = InvalidTimeout;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

/// Returns true when `text` is valid timeout syntax.
#[must_use]
pub fn is_valid_timeout(text: &str) -> bool {
    Timeout::parse(text).is_ok()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "range is checked before the cast"
)]
fn duration_from_nanos(nanos: f64) -> Option<Duration> {
    if nanos.is_nan() || nanos < 0.0 {
        return None;
    }
    // Anything the syntax allows is valid; oversized totals saturate.
    if nanos >= u64::MAX as f64 {
        return Some(Duration::from_nanos(u64::MAX));
    }
    Some(Duration::from_nanos(nanos.round() as u64))
}

fn split_decimal(input: &str) -> Option<(f64, &str)> {
    let integer_len = input.bytes().take_while(u8::is_ascii_digit).count();
    let mut end = integer_len;
    let mut fraction_len = 0;
    if input.as_bytes().get(end) == Some(&b'.') {
        end += 1;
        fraction_len = input
            .get(end..)?
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        end += fraction_len;
    }
    if integer_len == 0 && fraction_len == 0 {
        return None;
    }
    let number = input.get(..end)?.parse::<f64>().ok()?;
    Some((number, input.get(end..)?))
}

fn split_unit(input: &str) -> Option<(f64, &str)> {
    UNITS
        .iter()
        .find_map(|(suffix, scale)| input.strip_prefix(*suffix).map(|rest| (*scale, rest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sentinel_and_zero() {
        assert_eq!(Timeout::parse("-1"), Ok(Timeout::Disabled));
        assert_eq!(Timeout::parse("0"), Ok(Timeout::After(Duration::ZERO)));
        assert!(Timeout::Disabled.is_disabled());
        assert_eq!(Timeout::Disabled.duration(), None);
    }

    #[test]
    fn compound_durations_add_up() {
        assert_eq!(
            Timeout::parse("1m30s"),
            Ok(Timeout::After(Duration::from_secs(90)))
        );
        assert_eq!(
            Timeout::parse("1.5h"),
            Ok(Timeout::After(Duration::from_secs(5400)))
        );
        assert_eq!(
            Timeout::parse("250ms"),
            Ok(Timeout::After(Duration::from_millis(250)))
        );
        assert_eq!(
            Timeout::parse("10m"),
            Ok(Timeout::After(Duration::from_secs(600)))
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        for text in ["", "30", "-2", "-1s", "s", "5 m", "1d", "1.5", "m30s", ".s", "30s "] {
            assert!(Timeout::parse(text).is_err(), "accepted `{text}`");
        }
    }

    #[test]
    fn oversized_durations_saturate() {
        let longest = Timeout::After(Duration::from_nanos(u64::MAX));
        assert_eq!(Timeout::parse("100000000000000h"), Ok(longest));
        let digits = "9".repeat(400);
        assert_eq!(Timeout::parse(&format!("{digits}s")), Ok(longest));
    }

    #[test]
    fn error_names_the_value() {
        let error = Timeout::parse("soon").err();
        assert_eq!(error.as_ref().map(InvalidTimeout::value), Some("soon"));
    }

    proptest! {
        #[test]
        fn generated_components_parse(
            components in proptest::collection::vec(
                (0u32..1000, prop_oneof![
                    Just("ns"), Just("us"), Just("µs"), Just("ms"), Just("s"), Just("m"), Just("h")
                ]),
                1..4,
            )
        ) {
            let text: String = components
                .iter()
                .map(|(amount, unit)| format!("{amount}{unit}"))
                .collect();
            prop_assert!(is_valid_timeout(&text), "rejected `{}`", text);
        }
    }
}
