//! Materialized attribute values.
//!
//! A [`Value`] is what a populated entity property holds after a search
//! result row has been decoded. The directory wire format is byte/string
//! oriented; GUID and timestamp attributes arrive in platform encodings and
//! are decoded through the coercion helpers in this module.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01 (Unix epoch).
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Ticks (100ns intervals) per second.
const TICKS_PER_SEC: i64 = 10_000_000;

/// A decoded directory attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Attribute absent or property never populated.
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Timestamp(DateTime<Utc>),
    /// Multi-valued attribute.
    List(Vec<Value>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts a byte value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Extracts a GUID value.
    #[must_use]
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    /// Extracts a timestamp value.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the elements of a multi-valued attribute.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Decodes a GUID attribute from its raw byte encoding.
    ///
    /// Directory servers return GUID-typed attributes as a 16-byte blob;
    /// anything else is a type mismatch.
    pub fn guid_from_bytes(bytes: &[u8]) -> Result<Uuid> {
        Uuid::from_slice(bytes).map_err(|_| Error::GuidLength(bytes.len()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Uuid> for Value {
    fn from(g: Uuid) -> Self {
        Value::Guid(g)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

/// The declared kind of an entity property.
///
/// Drives decoding in the materializer: list kinds collect every value of a
/// multi-valued attribute, `Bytes` always takes the raw single value, and
/// `Guid`/`Timestamp` trigger the platform-encoding coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Int,
    Bool,
    Bytes,
    Guid,
    Timestamp,
    TextList,
    IntList,
}

impl ValueKind {
    /// Whether this kind collects every value of a multi-valued attribute.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, ValueKind::TextList | ValueKind::IntList)
    }
}

/// Converts a FILETIME tick pair (100ns intervals since 1601-01-01 UTC,
/// split across two interop fields) into a UTC timestamp.
///
/// Negative tick counts and values beyond chrono's representable range are
/// rejected.
pub fn filetime_to_utc(high: i32, low: u32) -> Result<DateTime<Utc>> {
    let ticks = ((high as i64) << 32) | (low as i64);
    if ticks < 0 {
        return Err(Error::TimestampRange(ticks));
    }
    let secs = ticks / TICKS_PER_SEC - FILETIME_UNIX_OFFSET_SECS;
    let nanos = ((ticks % TICKS_PER_SEC) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).ok_or(Error::TimestampRange(ticks))
}

/// Converts a UTC timestamp back into a FILETIME tick pair.
///
/// Used on the write-back path and when embedding timestamp literals into
/// filter strings.
pub fn utc_to_filetime(ts: DateTime<Utc>) -> (i32, u32) {
    let ticks = (ts.timestamp() + FILETIME_UNIX_OFFSET_SECS) * TICKS_PER_SEC
        + i64::from(ts.timestamp_subsec_nanos() / 100);
    ((ticks >> 32) as i32, ticks as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filetime_round_trips() {
        let ts = DateTime::from_timestamp(1_700_000_000, 123_456_700).unwrap();
        let (high, low) = utc_to_filetime(ts);
        assert_eq!(filetime_to_utc(high, low).unwrap(), ts);
    }

    #[test]
    fn filetime_epoch_is_1601() {
        let ts = filetime_to_utc(0, 0).unwrap();
        assert_eq!(ts.to_rfc3339(), "1601-01-01T00:00:00+00:00");
    }

    #[test]
    fn negative_ticks_rejected() {
        assert!(filetime_to_utc(-1, 0).is_err());
    }

    #[test]
    fn guid_requires_16_bytes() {
        assert!(Value::guid_from_bytes(&[0u8; 16]).is_ok());
        let err = Value::guid_from_bytes(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, Error::GuidLength(7)));
    }
}
