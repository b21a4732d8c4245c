//! Error types for the execution engine.

use crate::backend::BackendError;
use arbor_model::ModelError;
use arbor_query::QueryError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while executing queries or flushing changes.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Compile-stage failure, raised before any backend call.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Metadata lookup failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Error surfaced unchanged from the backend collaborator.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Protocol-channel data could not be coerced into the property's
    /// declared kind. Aborts the row being materialized.
    #[error("attribute `{attribute}` cannot populate property `{property}`: {detail}")]
    TypeMismatch {
        property: String,
        attribute: String,
        detail: String,
    },

    /// Write-back to a native-bound property without the native metadata
    /// part (native-reader tag, reader, or row handle).
    #[error("cannot write native-bound property `{property}` on `{entity_type}`: {detail}")]
    MissingNative {
        entity_type: String,
        property: String,
        detail: &'static str,
    },

    /// A source or child context name already taken in this context.
    #[error("duplicate entity name `{0}` in directory context")]
    DuplicateName(String),

    /// No source registered under the name.
    #[error("no source named `{0}` in directory context")]
    SourceNotFound(String),

    /// The named source is registered with a different entity type.
    #[error("source `{0}` is registered with a different entity type")]
    SourceType(String),

    /// A nested context's relative path failed to resolve.
    #[error("failed to resolve child context `{name}`")]
    ChildResolution {
        name: String,
        #[source]
        source: BackendError,
    },

    /// One or more ledger entries failed to write back. Successful entries
    /// have already been cleared; the listed ones remain dirty.
    #[error("write-back failed for {attempted} attempted entries; failures: {failures:?}")]
    FlushFailed {
        attempted: usize,
        /// `(dn, reason)` per failed entry.
        failures: Vec<(String, String)>,
    },
}
