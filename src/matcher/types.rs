//! Typed comparison values and coercion from JSON.

use crate::ir::FieldType;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// A single comparison value after coercion to a field type.
///
/// Event values arrive as whatever JSON type the logging collaborator stored
/// (numbers are often strings), so both sides of a comparison are coerced
/// through [`Scalar::coerce`] with the same field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Double(f64),
    Long(i64),
    Boolean(bool),
}

impl Scalar {
    /// Coerce a raw JSON value. Returns `None` when the value cannot represent
    /// the field type; object and nested fields never produce a scalar.
    ///
    /// ```rust
    /// use criteria_engine::matcher::Scalar;
    /// use criteria_engine::FieldType;
    /// use serde_json::json;
    ///
    /// assert_eq!(Scalar::coerce(&json!("10"), FieldType::Long), Some(Scalar::Long(10)));
    /// assert_eq!(Scalar::coerce(&json!("TRUE"), FieldType::Boolean), Some(Scalar::Boolean(true)));
    /// assert_eq!(Scalar::coerce(&json!("ten"), FieldType::Double), None);
    /// ```
    pub fn coerce(raw: &Value, field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::String => match raw {
                Value::String(s) => Some(Self::String(s.clone())),
                Value::Number(n) => Some(Self::String(n.to_string())),
                Value::Bool(b) => Some(Self::String(b.to_string())),
                _ => None,
            },
            FieldType::Double => match raw {
                Value::Number(n) => n.as_f64().map(Self::Double),
                Value::String(s) => parse_double(s).map(Self::Double),
                _ => None,
            },
            FieldType::Long => {
                let long = match raw {
                    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
                    Value::String(s) => parse_long(s),
                    _ => None,
                };
                long.map(Self::Long)
            }
            FieldType::Boolean => match raw {
                Value::Bool(b) => Some(Self::Boolean(*b)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => {
                    Some(Self::Boolean(true))
                }
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                    Some(Self::Boolean(false))
                }
                _ => None,
            },
            FieldType::Object | FieldType::Nested => None,
        }
    }

    /// Numeric view used by ordering comparators.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Long(l) => Some(*l as f64),
            Self::String(s) => parse_double(s),
            Self::Boolean(_) => None,
        }
    }

    /// Text view used by substring, prefix and regex comparators.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::String(s) => Cow::Borrowed(s),
            Self::Double(d) => Cow::Owned(d.to_string()),
            Self::Long(l) => Cow::Owned(l.to_string()),
            Self::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }

    /// Type-aware equality. Longs and doubles compare numerically.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Double(_), Self::Long(_) | Self::Double(_))
            | (Self::Long(_), Self::Double(_)) => self.as_f64() == other.as_f64(),
            _ => false,
        }
    }

    /// Numeric ordering. Longs compare exactly; everything else through `f64`.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

fn parse_double(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}

fn parse_long(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| parse_double(trimmed).and_then(integral))
}

fn integral(d: f64) -> Option<i64> {
    if d.fract() == 0.0 && d >= i64::MIN as f64 && d <= i64::MAX as f64 {
        Some(d as i64)
    } else {
        None
    }
}

/// Whether a resolved value counts as set: present, and not an empty string,
/// object or array.
pub fn is_set_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
