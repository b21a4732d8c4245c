//! Query execution engine for arbor.
//!
//! Drives a compiled query through one directory search and back:
//!
//! - **Backend seam**: [`DirectoryBackend`] and [`NativeReader`] are the
//!   only collaborators that touch the outside world; this crate performs
//!   no I/O beyond invoking them
//! - **Sources**: [`TypedSource`] binds an entity type to a search root,
//!   scope, and options, and owns the dirty ledger for everything it yields
//! - **Materializer**: the lazy row iterators decode raw attribute values
//!   into typed instances, wrapped in [`Tracked`] handles
//! - **Change tracking**: mutations through a [`Tracked`] handle accumulate
//!   in the source's [`DirtyLedger`]; [`TypedSource::flush`] writes them
//!   back with one commit per entry
//! - **Contexts**: [`DirectoryContext`] aggregates named sources and nested
//!   sub-contexts under scoped search roots and cascades flushes
//!
//! Everything is synchronous and single-threaded; the search and the
//! per-entry commits are the only blocking operations, both delegated to
//! the backend.

mod backend;
mod context;
mod error;
mod materialize;
pub mod mock;
mod source;
mod tracker;

pub use backend::{
    BackendError, BackendResult, DirectoryBackend, NativeHandle, NativeReader, RawEntry,
    SearchOptions, SearchRequest,
};
pub use context::DirectoryContext;
pub use error::{EngineError, EngineResult};
pub use materialize::{EntityRows, ProjectedRows};
pub use source::{ProjectedQueryBuilder, QueryBuilder, TypedSource};
pub use tracker::{DirtyLedger, Tracked};
