//! Response normalizers: upstream payloads in, typed entities out.
//!
//! # Design
//! Each normalizer is a pure function `&Value -> Result<Entity, ParseError>`.
//! Upstream shapes are spelled out as private serde structs carrying the
//! portal's own (Italian) field names, so a missing required field fails with
//! a `ParseError` instead of leaking a hole into the entity. Raw date strings
//! never leave this module: every instant is converted to `EpochMillis`.
//!
//! Optional nested lists are tolerant: the portal sends an absent key, `null`
//! or `""` where it means "nothing", and all of them normalize to an empty
//! `Vec`.

pub mod booking;
pub mod course;
pub mod date;
pub mod duration;
pub mod exam;
pub mod marks;
pub mod material;
pub mod notification;
pub mod rules;
pub mod ticket;
pub mod timetable;
pub mod user;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ParseError;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub(crate) fn decode<T: DeserializeOwned>(what: &'static str, raw: &Value) -> Result<T, ParseError> {
    T::deserialize(raw).map_err(|e| ParseError::from_serde(what, e))
}

/// Decode a list that may be blank; see `list_or_empty`.
pub(crate) fn decode_list<T: DeserializeOwned>(what: &'static str, raw: &Value) -> Result<Vec<T>, ParseError> {
    list_or_empty(raw).map_err(|e| ParseError::from_serde(what, e))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// A list field that upstream may send as absent, `null` or `""`.
pub(crate) fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| T::deserialize(item).map_err(D::Error::custom))
            .collect(),
        other if is_blank(&other) => Ok(Vec::new()),
        other => Err(D::Error::custom(format!("expected a list, got {other}"))),
    }
}

/// An object field that upstream may send as absent, `null`, `""` or `[]`.
pub(crate) fn object_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if is_blank(&value) {
        return Ok(None);
    }
    T::deserialize(value).map(Some).map_err(D::Error::custom)
}

/// Identifiers arrive as either JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected a string or number, got {other}"))),
    }
}

/// Like `string_or_number`, for optional fields.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!("expected a string or number, got {other}"))),
    }
}

/// Integers that upstream occasionally quotes.
pub(crate) fn opt_int_lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}"))),
        other => Err(D::Error::custom(format!("expected an integer, got {other}"))),
    }
}

/// Extract a required string field, e.g. the `url` of a redirect payload.
pub fn string_field(what: &'static str, raw: &Value, field: &str) -> Result<String, ParseError> {
    match raw.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ParseError::new(what, format!("`{field}` is not a string: {other}"))),
        None => Err(ParseError::new(what, format!("missing field `{field}`"))),
    }
}
