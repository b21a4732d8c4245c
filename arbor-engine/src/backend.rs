//! Backend seam.
//!
//! Defines the two collaborator capabilities the engine consumes: the
//! directory transport ([`DirectoryBackend`]) and the platform-specific
//! attribute helper ([`NativeReader`]). The engine never performs I/O
//! itself; connection management, paging, and referral chasing all live
//! behind these traits.

use arbor_types::{RawValue, SearchScope, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// An error surfaced by a backend collaborator. Passed through to callers
/// unchanged.
#[derive(Debug, Clone, thiserror::Error)]
#[error("directory backend error: {0}")]
pub struct BackendError(pub String);

impl BackendError {
    /// Creates a backend error from any displayable cause.
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

/// Opaque native object handle attached to a search result row.
/// Each backend implementation wraps its own platform type inside this.
#[derive(Clone)]
pub struct NativeHandle(Arc<dyn Any + Send + Sync>);

impl NativeHandle {
    /// Wraps a backend-specific native object.
    pub fn new<T: Any + Send + Sync + 'static>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Borrows back the backend-specific type.
    #[must_use]
    pub fn downcast_ref<T: Any + Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NativeHandle(..)")
    }
}

/// One raw search result row.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute name to raw value list.
    pub attributes: HashMap<String, Vec<RawValue>>,
    /// Native object handle for the native-reader channel, when the
    /// backend exposes one.
    pub native: Option<NativeHandle>,
}

impl RawEntry {
    /// Creates an empty entry at a DN.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
            native: None,
        }
    }

    /// Adds an attribute value list.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = RawValue>,
    ) -> Self {
        self.attributes
            .insert(name.into(), values.into_iter().collect());
        self
    }

    /// Attaches a native handle.
    #[must_use]
    pub fn with_native(mut self, handle: NativeHandle) -> Self {
        self.native = Some(handle);
        self
    }
}

/// Search limits inherited from the source configuration, opaque to the
/// engine and forwarded to the backend as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of entries to return.
    pub size_limit: Option<usize>,
    /// Server-side time limit.
    pub time_limit: Option<Duration>,
}

/// One complete search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Search root DN.
    pub base: String,
    pub scope: SearchScope,
    /// Final filter string, object-class term included.
    pub filter: String,
    /// Protocol attribute names to retrieve.
    pub attributes: Vec<String>,
    pub options: SearchOptions,
}

/// The directory transport capability.
///
/// One `search` call per query execution; the write methods serve the
/// flush path, with `commit` called once per entry after its attributes
/// are staged.
pub trait DirectoryBackend: Send + Sync {
    /// Executes a single search and returns all raw result rows.
    fn search(&self, request: &SearchRequest) -> BackendResult<Vec<RawEntry>>;

    /// Stages an attribute value on an entry.
    fn write_attribute(&self, dn: &str, attribute: &str, value: &Value) -> BackendResult<()>;

    /// Commits all staged attribute writes on an entry.
    fn commit(&self, dn: &str) -> BackendResult<()>;

    /// Resolves a relative path under a base DN, for nested contexts.
    fn resolve_child(&self, base: &str, rdn: &str) -> BackendResult<String>;
}

/// The platform-specific typed attribute helper.
///
/// Reads and writes named properties directly on a row's native object
/// handle; used for attributes that have no protocol representation.
pub trait NativeReader: Send + Sync {
    /// Reads a named property from a native handle.
    fn get_named(&self, handle: &NativeHandle, name: &str) -> BackendResult<Value>;

    /// Writes a named property through a native handle.
    fn set_named(&self, handle: &NativeHandle, name: &str, value: &Value) -> BackendResult<()>;
}
