// ABOUTME: Dynamic column value type shared by cursors, records, and mapping rows
// ABOUTME: Provides conversions into record fields and SQL-literal rendering for statement logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Column values
//!
//! [`Value`] is what a row cursor yields for every column and what positional
//! statement arguments are written as. [`MapRow`] is the open key/value row
//! shape used by mapping destinations.

use crate::errors::{BindError, BindResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single driver-level column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// Double-precision float
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Raw binary payload
    Bytes(Vec<u8>),
}

/// Open column-name to value mapping for one row
pub type MapRow = HashMap<String, Value>;

impl Value {
    /// Returns true if the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, used in scan error messages
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Tries to get as string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Tries to get as integer
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Coerce raw binary payloads to text, pass every other value through
    ///
    /// Bytes that are not valid UTF-8 cannot be represented as text without
    /// altering them, so they are passed through unchanged.
    #[must_use]
    pub fn into_text_if_bytes(self) -> Self {
        match self {
            Self::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(e) => Self::Bytes(e.into_bytes()),
            },
            other => other,
        }
    }

    /// Render as a SQL literal for diagnostic statement text
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_owned(),
            Self::Bool(b) => (if *b { "1" } else { "0" }).to_owned(),
            Self::Integer(i) => i.to_string(),
            Self::Real(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Bytes(b) => format!("X'{}'", hex::encode_upper(b)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Substitute positional `?` placeholders with argument literals
///
/// Placeholders inside single-quoted string literals are left alone, as are
/// placeholders beyond the number of supplied arguments. The result is for
/// logs only and is never sent to the driver.
#[must_use]
pub fn interpolate(statement: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(statement.len() + args.len() * 8);
    let mut args = args.iter();
    let mut in_quotes = false;

    for ch in statement.chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            '?' if !in_quotes => match args.next() {
                Some(arg) => out.push_str(&arg.to_sql_literal()),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

/// Conversion from a column value into a record field type
pub trait FromValue: Sized {
    /// Convert, failing with a scan error on incompatible values
    ///
    /// # Errors
    ///
    /// Returns a scan error when the value kind cannot represent `Self`
    fn from_value(value: Value) -> BindResult<Self>;
}

fn mismatch<T>(target: &str, value: &Value) -> BindResult<T> {
    Err(BindError::scan(format!(
        "cannot scan {} value into {target}",
        value.kind()
    )))
}

impl FromValue for Value {
    fn from_value(value: Value) -> BindResult<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Bool(b) => Ok(Self::from(b)),
            other => mismatch("i64", &other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> BindResult<Self> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide)
            .map_err(|_| BindError::scan(format!("integer {wide} out of range for i32")))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> BindResult<Self> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide)
            .map_err(|_| BindError::scan(format!("integer {wide} out of range for u32")))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as Self),
            other => mismatch("f64", &other),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            other => mismatch("bool", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(bytes) => Self::from_utf8(bytes)
                .map_err(|e| BindError::scan(format!("bytes are not valid UTF-8: {e}"))),
            other => mismatch("String", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch("Vec<u8>", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Build a positional argument list: `args![1, "alice", None::<i64>]`
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_become_text() {
        let value = Value::Bytes(b"hello".to_vec()).into_text_if_bytes();
        assert_eq!(value, Value::Text("hello".to_owned()));
    }

    #[test]
    fn test_non_bytes_pass_through() {
        assert_eq!(Value::Integer(7).into_text_if_bytes(), Value::Integer(7));
        assert_eq!(Value::Null.into_text_if_bytes(), Value::Null);
        assert_eq!(Value::Real(1.5).into_text_if_bytes(), Value::Real(1.5));
    }

    #[test]
    fn test_invalid_utf8_bytes_are_kept() {
        let raw = vec![0xff, 0xfe, 0x00];
        let value = Value::Bytes(raw.clone()).into_text_if_bytes();
        assert_eq!(value, Value::Bytes(raw));
    }

    #[test]
    fn test_interpolate_placeholders() {
        let sql = "select * from users where name = ? and id > ? and note = '?'";
        let text = interpolate(sql, &args!["o'brien", 3]);
        assert_eq!(
            text,
            "select * from users where name = 'o''brien' and id > 3 and note = '?'"
        );
    }

    #[test]
    fn test_interpolate_leaves_surplus_placeholders() {
        let text = interpolate("update t set a = ?, b = ?", &args![Value::Bytes(vec![0xab])]);
        assert_eq!(text, "update t set a = X'AB', b = ?");
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(i64::from_value(Value::Integer(4)).unwrap(), 4);
        assert!((f64::from_value(Value::Integer(2)).unwrap() - 2.0).abs() < f64::EPSILON);
        assert!(bool::from_value(Value::Integer(1)).unwrap());
        assert_eq!(
            Option::<String>::from_value(Value::Null).unwrap(),
            None::<String>
        );
        assert_eq!(
            String::from_value(Value::Bytes(b"abc".to_vec())).unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_from_value_mismatch_is_scan_error() {
        let err = i64::from_value(Value::Text("x".to_owned())).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::ScanFailed);
        assert!(err.message.contains("text"));
    }
}
