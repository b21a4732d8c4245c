//! Mock collaborators for testing.
//!
//! In-memory, call-counting implementations of [`DirectoryBackend`] and
//! [`NativeReader`]. Tests assert on the recorded requests, writes, and
//! commits; failure injection covers the partial-failure paths.

use crate::backend::{
    BackendError, BackendResult, DirectoryBackend, NativeHandle, NativeReader, RawEntry,
    SearchRequest,
};
use arbor_types::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// An in-memory directory backend.
///
/// Every search returns the full set of added entries; tests assert on the
/// recorded request to verify what the engine asked for.
#[derive(Default)]
pub struct MockDirectory {
    entries: Mutex<Vec<RawEntry>>,
    requests: Mutex<Vec<SearchRequest>>,
    writes: Mutex<Vec<(String, String, Value)>>,
    commits: Mutex<Vec<String>>,
    failing_commits: Mutex<HashSet<String>>,
    failing_children: Mutex<HashSet<String>>,
}

impl MockDirectory {
    /// Creates an empty mock directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry returned by every subsequent search.
    pub fn add_entry(&self, entry: RawEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Number of search calls issued so far.
    #[must_use]
    pub fn search_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent search request.
    #[must_use]
    pub fn last_request(&self) -> Option<SearchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// All staged attribute writes, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String, Value)> {
        self.writes.lock().unwrap().clone()
    }

    /// All committed DNs, in order.
    #[must_use]
    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    /// Makes `commit` fail for a DN.
    pub fn fail_commit(&self, dn: &str) {
        self.failing_commits.lock().unwrap().insert(dn.to_string());
    }

    /// Makes `resolve_child` fail for a relative path.
    pub fn fail_child(&self, rdn: &str) {
        self.failing_children.lock().unwrap().insert(rdn.to_string());
    }
}

impl DirectoryBackend for MockDirectory {
    fn search(&self, request: &SearchRequest) -> BackendResult<Vec<RawEntry>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.entries.lock().unwrap().clone())
    }

    fn write_attribute(&self, dn: &str, attribute: &str, value: &Value) -> BackendResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((dn.to_string(), attribute.to_string(), value.clone()));
        Ok(())
    }

    fn commit(&self, dn: &str) -> BackendResult<()> {
        if self.failing_commits.lock().unwrap().contains(dn) {
            return Err(BackendError::new(format!("commit refused for {dn}")));
        }
        self.commits.lock().unwrap().push(dn.to_string());
        Ok(())
    }

    fn resolve_child(&self, base: &str, rdn: &str) -> BackendResult<String> {
        if self.failing_children.lock().unwrap().contains(rdn) {
            return Err(BackendError::new(format!("no such object: {rdn}")));
        }
        Ok(format!("{rdn},{base}"))
    }
}

/// An in-memory native attribute reader.
///
/// Handles wrap the entry DN as a `String`; values are keyed by
/// `(dn, attribute)`. Missing keys fail the getter, which the materializer
/// tolerates per property.
#[derive(Default)]
pub struct MockNativeReader {
    values: Mutex<HashMap<(String, String), Value>>,
    writes: Mutex<Vec<(String, String, Value)>>,
}

impl MockNativeReader {
    /// Creates an empty mock reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the native handle this mock expects on entries.
    #[must_use]
    pub fn handle(dn: &str) -> NativeHandle {
        NativeHandle::new(dn.to_string())
    }

    /// Seeds a readable value.
    pub fn set_value(&self, dn: &str, attribute: &str, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert((dn.to_string(), attribute.to_string()), value);
    }

    /// All writes performed through the reader, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

impl NativeReader for MockNativeReader {
    fn get_named(&self, handle: &NativeHandle, name: &str) -> BackendResult<Value> {
        let dn = handle
            .downcast_ref::<String>()
            .ok_or_else(|| BackendError::new("unexpected native handle type"))?;
        self.values
            .lock()
            .unwrap()
            .get(&(dn.clone(), name.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::new(format!("no native value for {dn}/{name}")))
    }

    fn set_named(&self, handle: &NativeHandle, name: &str, value: &Value) -> BackendResult<()> {
        let dn = handle
            .downcast_ref::<String>()
            .ok_or_else(|| BackendError::new("unexpected native handle type"))?;
        let mut values = self.values.lock().unwrap();
        values.insert((dn.clone(), name.to_string()), value.clone());
        self.writes
            .lock()
            .unwrap()
            .push((dn.clone(), name.to_string(), value.clone()));
        Ok(())
    }
}
