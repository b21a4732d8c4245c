//! Raw protocol values.
//!
//! A directory search row carries, per attribute, a list of raw values in
//! whatever encoding the protocol produced. Decoding into [`Value`]s is
//! schema-driven and happens in the materializer.

use crate::Value;
use serde::{Deserialize, Serialize};

/// A single raw attribute value as returned by the directory protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    /// A platform-native 64-bit tick value split across two interop fields.
    LargeInt { high: i32, low: u32 },
}

impl RawValue {
    /// Direct conversion without schema-driven coercion.
    ///
    /// GUID and timestamp decoding need the target property kind and are
    /// not performed here; a `LargeInt` converts to its combined integer.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            RawValue::Text(s) => Value::Text(s.clone()),
            RawValue::Bytes(b) => Value::Bytes(b.clone()),
            RawValue::Int(n) => Value::Int(*n),
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::LargeInt { high, low } => {
                Value::Int(((*high as i64) << 32) | (*low as i64))
            }
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        RawValue::Bytes(b)
    }
}
