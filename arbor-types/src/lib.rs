//! Core type definitions for arbor.
//!
//! This crate defines the fundamental, schema-agnostic types used throughout
//! the query layer:
//! - Materialized attribute values ([`Value`]) and their kinds ([`ValueKind`])
//! - Raw protocol values as returned by a directory search ([`RawValue`])
//! - Search scope ([`SearchScope`])
//! - Coercions for GUID and FILETIME attribute encodings
//!
//! All schema-specific types (entity metadata, bindings, query trees) belong
//! in their respective crates, not here.

mod raw;
mod scope;
mod value;

pub use raw::RawValue;
pub use scope::SearchScope;
pub use value::{filetime_to_utc, utc_to_filetime, Value, ValueKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in value operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("GUID attribute value must be 16 bytes, got {0}")]
    GuidLength(usize),

    #[error("tick value {0} is outside the representable timestamp range")]
    TimestampRange(i64),
}
