//! Lenient field coercion for task data coming from forms, backups and old
//! payloads.
//!
//! These helpers never fail on bad values: an out-of-range importance becomes
//! the default, an unknown status becomes `pending`, an unparseable date
//! becomes absent. Keep this separate from `priority::score`, which rejects
//! the same inputs.

use crate::task::{MAX_TASK_LEVEL, MIN_TASK_LEVEL, PortableTask, Status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Importance/urgency used when the supplied value is unusable.
pub const DEFAULT_LEVEL: u8 = 2;

/// Coerce a raw integer to an importance/urgency level.
pub fn coerce_level(value: i64) -> u8 {
    if (1..=3).contains(&value) {
        value as u8
    } else {
        DEFAULT_LEVEL
    }
}

/// Clamp a raw tree depth into `MIN_TASK_LEVEL..=MAX_TASK_LEVEL`.
pub fn clamp_task_level(value: i64) -> u8 {
    value.clamp(MIN_TASK_LEVEL as i64, MAX_TASK_LEVEL as i64) as u8
}

/// Hours are non-negative; NaN and infinities count as zero.
pub fn clamp_hours(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Parse a timestamp from an RFC 3339 string or a bare `YYYY-MM-DD` date
/// (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub(crate) fn default_level() -> u8 {
    DEFAULT_LEVEL
}

pub(crate) fn default_task_level() -> u8 {
    MIN_TASK_LEVEL
}

pub(crate) fn level<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(integer(&value).map(coerce_level).unwrap_or(DEFAULT_LEVEL))
}

pub(crate) fn task_level<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(d)?;
    let raw = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        other => integer(other),
    };
    Ok(raw.map(clamp_task_level).unwrap_or(MIN_TASK_LEVEL))
}

pub(crate) fn status<'de, D: Deserializer<'de>>(d: D) -> Result<Status, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value.as_str().and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// A status in a patch: unknown values mean "leave unchanged".
pub(crate) fn patch_status<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Status>, D::Error> {
    let value = Value::deserialize(d)?;
    let parsed: Option<Status> = value.as_str().and_then(|s| s.parse().ok());
    if parsed.is_none() && !value.is_null() {
        log::warn!("Ignoring invalid status in patch: {}", value);
    }
    Ok(parsed)
}

pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub(crate) fn opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(timestamp(&value))
}

/// Present-but-null clears the field; absent leaves it alone (via `default`).
pub(crate) fn patch_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(Some(timestamp(&value)))
}

pub(crate) fn hours<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(d)?;
    let raw = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(raw.map(clamp_hours).unwrap_or(0.0))
}

pub(crate) fn sub_tasks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PortableTask>, D::Error> {
    match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}
