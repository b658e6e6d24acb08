//! Typed SQL values and their literal textual representation.
//!
//! [`Value`] is the tagged variant carried by query-builder assignments, WHERE
//! conditions and materialized record fields. [`Value::sql_literal`] renders any
//! value as MySQL-family literal text; it is total: every variant has a defined
//! mapping and no input raises.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt::Write as _;

/// A reference to one member of a synthesized SQL enumeration.
///
/// `code` is the member's 1-based position in the declared literal list
/// (0 is the reserved `invalid` sentinel) when it is known.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Member name (the declared string literal, or `invalid`).
    pub name: String,
    /// Underlying integer code, when known.
    pub code: Option<i64>,
}

impl EnumValue {
    /// Create a member reference with a known code.
    pub fn new(name: impl Into<String>, code: i64) -> Self {
        Self {
            name: name.into(),
            code: Some(code),
        }
    }

    /// Create a member reference by name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
        }
    }
}

/// A typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean, rendered as 1/0
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time
    DateTime(NaiveDateTime),
    /// Character data
    Text(String),
    /// Byte sequence, rendered as an X'..' hex literal
    Bytes(Vec<u8>),
    /// Structured data, rendered as a quoted JSON string
    Json(serde_json::Value),
    /// Enumeration member
    Enum(EnumValue),
}

impl Value {
    /// Render this value as MySQL-family literal text.
    ///
    /// Text (and the textual fallbacks) is quoted with every embedded single
    /// quote doubled. That is the only escaping performed; statements built from
    /// these literals are not parameterized.
    pub fn sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => quote(&t.format("%H:%M:%S").to_string()),
            Value::DateTime(dt) => quote(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Value::Text(s) => quote(s),
            Value::Bytes(b) => {
                let mut out = String::with_capacity(b.len() * 2 + 4);
                out.push_str("X'");
                for byte in b {
                    // Infallible: writing to a String cannot fail.
                    let _ = write!(out, "{byte:02x}");
                }
                out.push('\'');
                out
            }
            Value::Json(j) => quote(&j.to_string()),
            Value::Enum(e) => match e.code {
                Some(code) => code.to_string(),
                None => quote(&e.name),
            },
        }
    }

    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text payload, if this is `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Enum payload, if this is an `Enum`.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// Quote a string literal, doubling embedded single quotes.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
