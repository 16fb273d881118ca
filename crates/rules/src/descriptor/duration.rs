//! Duration string parsing for `minInterval`, `timeout` and `updateInterval`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{Result, RuleError};

/// Parse a human-readable duration string into a [`Duration`].
///
/// Supports components: `Xd` (days), `Xh` (hours), `Xm` (minutes), `Xs`
/// (seconds), `Xms`, `Xus`/`Xµs` and `Xns`. Each component may carry a
/// decimal part ("1.5s", "0.25h") and components can be combined: "2h30m",
/// "1m30s", "1s500ms". A bare number is treated as seconds.
/// Returns `Ok(None)` if the string is empty.
pub fn parse_duration(s: &str) -> Result<Option<Duration>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut total_ns: u64 = 0;
    let mut num_buf = String::new();
    let mut found_unit = false;
    let mut chars = trimmed.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_ascii_digit() || ch == '.' {
            num_buf.push(ch);
            continue;
        }

        if num_buf.is_empty() {
            return Err(RuleError::malformed(s, format!("unit '{}' without a number", ch)));
        }

        let factor: u64 = match ch {
            'd' => 86_400_000_000_000,
            'h' => 3_600_000_000_000,
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1_000_000
            }
            'm' => 60_000_000_000,
            's' => 1_000_000_000,
            'u' | 'µ' if chars.peek() == Some(&'s') => {
                chars.next();
                1_000
            }
            'n' if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            other => return Err(RuleError::malformed(s, format!("unknown unit '{}'", other))),
        };
        let component = scale(s, &num_buf, factor)?;
        num_buf.clear();
        total_ns = total_ns
            .checked_add(component)
            .ok_or_else(|| RuleError::malformed(s, "duration overflows"))?;
        found_unit = true;
    }

    if !num_buf.is_empty() {
        if found_unit {
            // Ambiguous: "30m15".
            return Err(RuleError::malformed(s, "trailing number without a unit"));
        }
        total_ns = scale(s, &num_buf, 1_000_000_000)?;
    }

    Ok(Some(Duration::from_nanos(total_ns)))
}

/// `number * factor` in nanoseconds. Whole numbers stay in integer arithmetic;
/// fractional ones are rounded to the nearest nanosecond.
fn scale(expr: &str, number: &str, factor: u64) -> Result<u64> {
    let overflow = || RuleError::malformed(expr, "duration overflows");

    if !number.contains('.') {
        let n: u64 = number
            .parse()
            .map_err(|_| RuleError::malformed(expr, "number out of range"))?;
        return n.checked_mul(factor).ok_or_else(overflow);
    }

    let n: f64 = number
        .parse()
        .map_err(|_| RuleError::malformed(expr, format!("invalid number '{}'", number)))?;
    let ns = (n * factor as f64).round();
    if !ns.is_finite() || ns >= u64::MAX as f64 {
        return Err(overflow());
    }
    Ok(ns as u64)
}

/// Render a duration in the same syntax [`parse_duration`] accepts.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else if d.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}ns", d.as_nanos())
    }
}

/// Serde adapter for optional duration fields; empty strings and `null` mean unset.
pub(crate) mod opt_duration {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => parse_duration(&s).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
