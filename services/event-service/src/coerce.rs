//! Lenient field decoding for ingress payloads.
//!
//! Relays and handheld bridges send numbers as strings and the other way
//! around. Every helper here maps `null` or a missing field to `None` and
//! rejects values that cannot be read as the target type.

use chrono::{DateTime, TimeZone, Utc};
use serde::{de::Error, Deserialize, Deserializer};
use serde_json::{Number, Value};

pub fn int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let wide = match &value {
        Value::Number(number) => integral(number),
        Value::String(text) => parse_integral(text.trim()),
        _ => None,
    };
    let wide = wide.ok_or_else(|| D::Error::custom(format!("expected an integer, got {value}")))?;
    i32::try_from(wide)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("integer {wide} out of range")))
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = match &value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|number| number.is_finite())
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

pub fn boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = match &value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match integral(number) {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a boolean, got {value}")))
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match value {
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(D::Error::custom(format!("expected text, got {other}"))),
    }
}

/// RFC 3339 strings or epoch milliseconds.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = match &value {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|time| time.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a timestamp, got {value}")))
}

fn integral(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
            .map(|value| value as i64)
    })
}

fn parse_integral(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .and_then(|number| integral(&number))
    })
}
