//! Protocol parameter values.
//!
//! The wire codec produces an ordered map from small integer keys to loosely
//! typed values. Keys are protocol-defined and not contiguous; values mix
//! integers of several widths, floats, strings, byte blobs and nested
//! sequences. [`Value`] collapses the integer widths into `i64` and the
//! float widths into `f64`; the accessors narrow back down at the use site.

use std::collections::BTreeMap;

use serde::Serialize;

/// Ordered parameter map attached to every frame.
pub type Parameters = BTreeMap<u8, Value>;

/// One decoded protocol parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    /// Integer view; floats are not coerced.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view, accepting integer-typed parameters (the protocol encodes
    /// whole-number coordinates as integers).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// View a two-element numeric list as an (x, y) pair.
    pub fn as_pair(&self) -> Option<(f32, f32)> {
        match self.as_list()? {
            [x, y] => Some((x.as_f32()?, y.as_f32()?)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}
