//! Dirty-field change tracking.
//!
//! Every entity a source yields is wrapped in a [`Tracked`] handle bound to
//! the source's [`DirtyLedger`]. Mutations through the handle validate the
//! property, apply it to the instance, and record the pending value in the
//! ledger; `TypedSource::flush` drains the ledger back to the directory.

use crate::backend::NativeHandle;
use crate::EngineResult;
use arbor_model::DirectoryEntity;
use arbor_types::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Pending write-back state for one directory entry.
#[derive(Debug, Default)]
pub(crate) struct LedgerEntry {
    /// Native handle captured at materialization, for native-channel
    /// write-back.
    pub(crate) native: Option<NativeHandle>,
    /// Mutated property names with their pending values. Re-setting a
    /// property overwrites its pending value, so marking is idempotent
    /// per property.
    pub(crate) changes: BTreeMap<String, Value>,
}

/// The per-source record of which properties on which materialized entries
/// have been mutated since load, pending write-back.
///
/// Entries are created on first mutation and removed when their write-back
/// succeeds. Owned exclusively by one source.
#[derive(Debug, Default)]
pub struct DirtyLedger {
    pub(crate) entries: HashMap<String, LedgerEntry>,
}

impl DirtyLedger {
    /// Records a mutation for an entry.
    pub(crate) fn mark(
        &mut self,
        dn: &str,
        native: Option<&NativeHandle>,
        property: &str,
        value: Value,
    ) {
        let entry = self.entries.entry(dn.to_string()).or_default();
        if entry.native.is_none() {
            entry.native = native.cloned();
        }
        entry.changes.insert(property.to_string(), value);
    }

    /// Number of entries with pending changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mutated property names for an entry, if it has any pending
    /// changes.
    #[must_use]
    pub fn changed_properties(&self, dn: &str) -> Option<Vec<&str>> {
        self.entries
            .get(dn)
            .map(|entry| entry.changes.keys().map(String::as_str).collect())
    }
}

/// A materialized entity bound to its source's ledger.
///
/// Dereferences to the entity for reads; all mutations go through
/// [`set`](Tracked::set) so the ledger sees them.
#[derive(Debug)]
pub struct Tracked<T: DirectoryEntity> {
    entity: T,
    dn: String,
    native: Option<NativeHandle>,
    ledger: Arc<Mutex<DirtyLedger>>,
}

impl<T: DirectoryEntity> Tracked<T> {
    pub(crate) fn new(
        entity: T,
        dn: String,
        native: Option<NativeHandle>,
        ledger: Arc<Mutex<DirtyLedger>>,
    ) -> Self {
        Self {
            entity,
            dn,
            native,
            ledger,
        }
    }

    /// The distinguished name of the backing directory entry.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Sets a property and records it in the source's ledger.
    ///
    /// Fails on names not declared for the entity type; the ledger only
    /// ever holds declared property names.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> EngineResult<()> {
        let value = value.into();
        self.entity.set_property(property, value.clone())?;
        self.ledger
            .lock()
            .expect("ledger lock poisoned")
            .mark(&self.dn, self.native.as_ref(), property, value);
        Ok(())
    }

    /// Consumes the handle, returning the entity without its tracking.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T: DirectoryEntity> std::ops::Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}
