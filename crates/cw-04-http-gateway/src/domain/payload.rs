//! Field reader for inbound JSON bodies.
//!
//! Absent and `null` fields are `missing_<field>`; present fields of the
//! wrong shape are `invalid_<field>`. Numbers may arrive as JSON numbers or
//! numeric strings.

use crate::domain::error::{ApiError, ApiResult};
use serde_json::{Map, Value};

/// View over a decoded JSON object.
pub struct FieldReader {
    body: Map<String, Value>,
}

impl FieldReader {
    /// Decode a request body; anything but a JSON object is `invalid_json`.
    pub fn parse(bytes: &[u8]) -> ApiResult<Self> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(body)) => Ok(Self { body }),
            _ => Err(ApiError::invalid_json()),
        }
    }

    /// Raw value if present and not `null`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field).filter(|v| !v.is_null())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// First field of `fields` that is absent, in order.
    pub fn require_all(&self, fields: &[&str]) -> ApiResult<()> {
        match fields.iter().find(|f| !self.has(f)) {
            Some(field) => Err(ApiError::missing(field)),
            None => Ok(()),
        }
    }

    pub fn require(&self, field: &str) -> ApiResult<&Value> {
        self.get(field).ok_or_else(|| ApiError::missing(field))
    }

    /// Text field; numbers and booleans are taken as their JSON text.
    pub fn string(&self, field: &str) -> ApiResult<String> {
        as_text(self.require(field)?).ok_or_else(|| ApiError::invalid(field))
    }

    pub fn opt_string(&self, field: &str) -> ApiResult<Option<String>> {
        self.get(field)
            .map(|v| as_text(v).ok_or_else(|| ApiError::invalid(field)))
            .transpose()
    }

    /// Non-negative integer.
    pub fn u64(&self, field: &str) -> ApiResult<u64> {
        as_u64(self.require(field)?).ok_or_else(|| ApiError::invalid(field))
    }

    pub fn opt_u64(&self, field: &str) -> ApiResult<Option<u64>> {
        self.get(field)
            .map(|v| as_u64(v).ok_or_else(|| ApiError::invalid(field)))
            .transpose()
    }

    /// Any number; non-finite values are rejected by callers that care.
    pub fn f64(&self, field: &str) -> ApiResult<f64> {
        as_f64(self.require(field)?).ok_or_else(|| ApiError::invalid(field))
    }

    /// Optional number, failing with `code` when present but not numeric.
    pub fn opt_f64_or(&self, field: &str, code: &'static str) -> ApiResult<Option<f64>> {
        self.get(field)
            .map(|v| {
                as_f64(v)
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ApiError::bad_request(code))
            })
            .transpose()
    }

    /// Only a JSON string yields a value; other shapes are treated as absent.
    pub fn str_if_string(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Only a JSON number yields a value; other shapes are treated as absent.
    pub fn u64_if_number(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
