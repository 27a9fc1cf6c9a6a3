//! Parse-or-zero coercions for loosely typed numeric input.
//!
//! Line items arrive from clients that send prices and quantities either as
//! JSON numbers or as strings. Nothing here fails: values that cannot be read
//! become zero (or `None` for timestamps) and the item is still priced.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;

/// Parse a decimal from text, accepting a lone comma as the decimal separator.
pub fn parse_decimal_or_zero(raw: &str) -> BigDecimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return BigDecimal::zero();
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    match BigDecimal::from_str(&normalized) {
        Ok(d) => d,
        Err(_) => {
            log::warn!("unparseable decimal {:?}, using 0", raw);
            BigDecimal::zero()
        }
    }
}

pub fn decimal_or_zero(value: &Value) -> BigDecimal {
    match value {
        Value::Number(n) => parse_decimal_or_zero(&n.to_string()),
        Value::String(s) => parse_decimal_or_zero(s),
        Value::Null => BigDecimal::zero(),
        other => {
            log::warn!("non-numeric value {} where a decimal was expected, using 0", other);
            BigDecimal::zero()
        }
    }
}

/// Whole quantity; fractional input is truncated toward zero.
pub fn quantity_or_zero(value: &Value) -> i32 {
    let d = decimal_or_zero(value);
    match d.with_scale(0).to_i32() {
        Some(q) => q,
        None => {
            log::warn!("quantity {} out of range, using 0", d);
            0
        }
    }
}

/// RFC 3339 strings or epoch milliseconds; anything else is treated as absent.
pub fn timestamp_or_none(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    log::warn!("unparseable timestamp {:?}: {}", s, e);
                    None
                }
            }
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
