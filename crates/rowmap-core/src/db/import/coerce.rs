//! JSON → cell value coercion.
//!
//! Integers widen across the integer family and accept numeric strings;
//! fractional numbers are truncated. Dates come from epoch milliseconds,
//! `/Date(ms)/` text or RFC 3339 / ISO 8601 text. Binary comes from
//! standard base64.

use crate::db::import::error::{JsonError, describe};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rowmap_schema::{
    types::FieldKind,
    value::{Timestamp, Value},
};
use serde_json::Value as JsonValue;
use time::{
    OffsetDateTime,
    format_description::well_known::{Iso8601, Rfc3339},
};

/// Coerce `json` into a value for a field of `kind`. JSON null (and an
/// empty date string) yields [`Value::Null`]; nullability is the caller's
/// concern.
pub(crate) fn coerce(kind: FieldKind, field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    if json.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        FieldKind::Bool => boolean(field, json),
        FieldKind::Int8 | FieldKind::Int16 | FieldKind::Int32 | FieldKind::Int64 => {
            integer(kind, field, json)
        }
        #[allow(clippy::cast_possible_truncation)]
        FieldKind::Float => float(kind, field, json).map(|v| Value::Float(v as f32)),
        FieldKind::Double => float(kind, field, json).map(Value::Double),
        FieldKind::String => string(field, json),
        FieldKind::Binary => binary(field, json),
        FieldKind::Timestamp => timestamp(field, json),
        FieldKind::Backlink | FieldKind::Link | FieldKind::LinkList => Err(invalid(kind, field, json)),
    }
}

fn invalid(kind: FieldKind, field: &str, json: &JsonValue) -> JsonError {
    JsonError::InvalidValue {
        field: field.to_string(),
        expected: kind,
        found: describe(json),
    }
}

fn boolean(field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    match json {
        JsonValue::Bool(v) => Ok(Value::Bool(*v)),
        JsonValue::String(s) if s == "true" => Ok(Value::Bool(true)),
        JsonValue::String(s) if s == "false" => Ok(Value::Bool(false)),
        _ => Err(invalid(FieldKind::Bool, field, json)),
    }
}

fn integer(kind: FieldKind, field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    let parsed = match json {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    let Some(v) = parsed else {
        return match json {
            JsonValue::Number(n) => Err(out_of_range(kind, field, n.to_string())),
            _ => Err(invalid(kind, field, json)),
        };
    };

    let value = Value::Int(v);
    if value.fits(kind) {
        Ok(value)
    } else {
        Err(out_of_range(kind, field, v.to_string()))
    }
}

fn out_of_range(kind: FieldKind, field: &str, value: String) -> JsonError {
    JsonError::OutOfRange {
        field: field.to_string(),
        kind,
        value,
    }
}

// Drop the fraction; `None` when the whole part does not fit in i64.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(v: f64) -> Option<i64> {
    let whole = v.trunc();
    if whole.is_finite() && whole >= i64::MIN as f64 && whole < i64::MAX as f64 {
        Some(whole as i64)
    } else {
        None
    }
}

fn float(kind: FieldKind, field: &str, json: &JsonValue) -> Result<f64, JsonError> {
    match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(kind, field, json))
}

fn string(field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    match json {
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Number(n) => Ok(Value::String(n.to_string())),
        JsonValue::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(invalid(FieldKind::String, field, json)),
    }
}

fn binary(field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    let JsonValue::String(text) = json else {
        return Err(invalid(FieldKind::Binary, field, json));
    };

    STANDARD
        .decode(text)
        .map(Value::Binary)
        .map_err(|err| JsonError::InvalidBinary {
            field: field.to_string(),
            reason: err.to_string(),
        })
}

fn timestamp(field: &str, json: &JsonValue) -> Result<Value, JsonError> {
    let millis = match json {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        JsonValue::String(text) if text.is_empty() => return Ok(Value::Null),
        JsonValue::String(text) => parse_date(text),
        _ => return Err(invalid(FieldKind::Timestamp, field, json)),
    };

    millis
        .map(|ms| Value::Timestamp(Timestamp::from_millis(ms)))
        .ok_or_else(|| JsonError::InvalidDate {
            field: field.to_string(),
            text: json.as_str().map_or_else(|| json.to_string(), str::to_string),
        })
}

fn parse_date(text: &str) -> Option<i64> {
    let text = text.trim();

    if let Ok(ms) = text.parse::<i64>() {
        return Some(ms);
    }
    if let Some(inner) = text
        .strip_prefix("/Date(")
        .and_then(|rest| rest.strip_suffix(")/"))
    {
        return legacy_date(inner);
    }

    let parsed = OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
        .ok()?;

    i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000).ok()
}

// `<ms>` with an optional `+hhmm` / `-hhmm` zone suffix, which does not
// move the instant.
fn legacy_date(inner: &str) -> Option<i64> {
    let digits_end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map_or(inner.len(), |(i, _)| i);
    let (millis, zone) = inner.split_at(digits_end);

    if !zone.is_empty() && !zone[1..].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    millis.parse::<i64>().ok()
}
