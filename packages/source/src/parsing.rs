//! Shared parsing utilities for raw crash rows.
//!
//! The hosted database returns months as ISO timestamps, counters as either
//! JSON numbers or numeric strings, and entity keys as whatever type the
//! column happens to have.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crash_map_analytics_models::month_start;
use crash_map_geography_models::EntityKey;
use serde_json::Value;

/// Parses a month column into the first day of that month.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD`, naive ISO datetimes (with or without
/// fractional seconds) and RFC 3339 timestamps.
#[must_use]
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(month_start(dt.date_naive()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(month_start(naive.date()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(month_start(date));
    }
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}

/// Reads a non-negative integer counter from a JSON value.
///
/// Numbers and numeric strings are accepted; whole-valued floats (as some
/// SQL aggregates return) are truncated. Empty strings and `null` are
/// treated as absent.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) if !s.trim().is_empty() => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| parse_count(&Value::from(s.parse::<f64>().ok()?)))
        }
        _ => None,
    }
}

/// Reads an entity key from a JSON value, coercing numeric-looking strings
/// to numbers.
#[must_use]
pub fn parse_entity_key(value: &Value) -> Option<EntityKey> {
    match value {
        Value::Number(n) => n.as_i64().map(EntityKey::Number),
        Value::String(s) if !s.trim().is_empty() => Some(EntityKey::coerce(s)),
        _ => None,
    }
}
