//! Typed sources and the query surface.
//!
//! A [`TypedSource`] binds an entity type to a search root, scope, and
//! options, and owns the dirty ledger for every entity it yields. The
//! query surface is exactly two composable operators — a filter and a
//! projection — anything either compiler cannot express fails in `fetch`,
//! before the backend is touched.

use crate::backend::{DirectoryBackend, NativeReader, SearchOptions};
use crate::materialize::{EntityRows, ProjectedRows};
use crate::tracker::{DirtyLedger, LedgerEntry};
use crate::{EngineError, EngineResult};
use arbor_model::{Channel, DirectoryEntity, SchemaRegistry, TypeMetadata};
use arbor_query::{CompiledQuery, Expr, Shape};
use arbor_types::SearchScope;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// A typed entity source scoped to one search root.
pub struct TypedSource<T: DirectoryEntity> {
    pub(crate) backend: Arc<dyn DirectoryBackend>,
    pub(crate) reader: Option<Arc<dyn NativeReader>>,
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) base: String,
    pub(crate) scope: SearchScope,
    pub(crate) options: SearchOptions,
    pub(crate) ledger: Arc<Mutex<DirtyLedger>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: DirectoryEntity> std::fmt::Debug for TypedSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedSource")
            .field("base", &self.base)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<T: DirectoryEntity> TypedSource<T> {
    /// Creates a source over a search root.
    pub fn new(
        backend: Arc<dyn DirectoryBackend>,
        registry: Arc<SchemaRegistry>,
        base: impl Into<String>,
        scope: SearchScope,
    ) -> Self {
        Self {
            backend,
            reader: None,
            registry,
            base: base.into(),
            scope,
            options: SearchOptions::default(),
            ledger: Arc::new(Mutex::new(DirtyLedger::default())),
            _entity: PhantomData,
        }
    }

    /// Attaches the native attribute reader.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn NativeReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Sets the inherited search options.
    #[must_use]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// The search root DN.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The search scope.
    #[must_use]
    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// Starts a query against this source.
    #[must_use]
    pub fn query(&self) -> QueryBuilder<'_, T> {
        QueryBuilder {
            source: self,
            predicate: None,
        }
    }

    /// Number of entries with pending changes in the ledger.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.ledger().len()
    }

    /// The mutated property names pending for an entry.
    #[must_use]
    pub fn changed_properties(&self, dn: &str) -> Option<Vec<String>> {
        self.ledger()
            .changed_properties(dn)
            .map(|names| names.into_iter().map(str::to_string).collect())
    }

    /// Writes every pending change back to the directory.
    ///
    /// Entries are processed independently: each entry's dirty properties
    /// are written through their channels, then the entry is committed
    /// once and removed from the ledger. Entries that fail stay dirty and
    /// are reported together in [`EngineError::FlushFailed`]; a fully
    /// successful pass leaves the ledger empty.
    pub fn flush(&self) -> EngineResult<()> {
        let metadata = self.registry.describe(T::TYPE_NAME)?.clone();
        let mut ledger = self.ledger();
        let attempted = ledger.len();
        if attempted == 0 {
            return Ok(());
        }

        let mut dns: Vec<String> = ledger.entries.keys().cloned().collect();
        dns.sort();

        let mut failures = Vec::new();
        for dn in dns {
            let Some(entry) = ledger.entries.get(&dn) else {
                continue;
            };
            match self.flush_entry(&metadata, &dn, entry) {
                Ok(()) => {
                    ledger.entries.remove(&dn);
                }
                Err(err) => {
                    warn!(%dn, %err, "write-back failed for entry");
                    failures.push((dn, err.to_string()));
                }
            }
        }

        if failures.is_empty() {
            debug!(entries = attempted, "flush complete");
            Ok(())
        } else {
            Err(EngineError::FlushFailed {
                attempted,
                failures,
            })
        }
    }

    fn flush_entry(
        &self,
        metadata: &TypeMetadata,
        dn: &str,
        entry: &LedgerEntry,
    ) -> EngineResult<()> {
        for (property, value) in &entry.changes {
            let Some(binding) = metadata.binding_for(property) else {
                // The ledger only ever holds declared names; an undeclared
                // one here means the registry changed underneath us.
                continue;
            };
            match binding.channel {
                Channel::Protocol => {
                    self.backend.write_attribute(dn, &binding.attribute, value)?;
                }
                Channel::NativeReader => {
                    if metadata.native_type.is_none() {
                        return Err(self.missing_native(
                            property,
                            "no native-reader type registered for the entity type",
                        ));
                    }
                    let reader = self.reader.as_deref().ok_or_else(|| {
                        self.missing_native(property, "no native reader configured on the source")
                    })?;
                    let handle = entry.native.as_ref().ok_or_else(|| {
                        self.missing_native(property, "the entry carries no native handle")
                    })?;
                    reader.set_named(handle, &binding.attribute, value)?;
                }
            }
        }
        // One commit per entry, after all of its properties are staged.
        self.backend.commit(dn)?;
        Ok(())
    }

    fn missing_native(&self, property: &str, detail: &'static str) -> EngineError {
        EngineError::MissingNative {
            entity_type: T::TYPE_NAME.to_string(),
            property: property.to_string(),
            detail,
        }
    }

    pub(crate) fn ledger(&self) -> MutexGuard<'_, DirtyLedger> {
        self.ledger.lock().expect("ledger lock poisoned")
    }
}

/// Builder for a query against a typed source.
pub struct QueryBuilder<'a, T: DirectoryEntity> {
    source: &'a TypedSource<T>,
    predicate: Option<Expr>,
}

impl<'a, T: DirectoryEntity> QueryBuilder<'a, T> {
    /// Adds a filter predicate. Multiple calls AND-combine.
    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Adds a projection, reshaping each yielded row.
    #[must_use]
    pub fn select(self, shape: Shape) -> ProjectedQueryBuilder<'a, T> {
        ProjectedQueryBuilder {
            source: self.source,
            predicate: self.predicate,
            shape,
        }
    }

    /// Compiles the query and returns the lazy entity sequence.
    ///
    /// Every compile-stage error — missing schema, unsupported expression,
    /// misplaced operand, native-bound property in filter position — is
    /// raised here, before any backend call.
    pub fn fetch(self) -> EngineResult<EntityRows<'a, T>> {
        let compiled = CompiledQuery::compile(
            &self.source.registry,
            T::TYPE_NAME,
            self.predicate.as_ref(),
            None,
        )?;
        let metadata = self.source.registry.describe(T::TYPE_NAME)?.clone();
        Ok(EntityRows::new(self.source, compiled, metadata))
    }
}

/// Builder for a projected query.
pub struct ProjectedQueryBuilder<'a, T: DirectoryEntity> {
    source: &'a TypedSource<T>,
    predicate: Option<Expr>,
    shape: Shape,
}

impl<'a, T: DirectoryEntity> ProjectedQueryBuilder<'a, T> {
    /// Adds a filter predicate. Multiple calls AND-combine.
    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Compiles the query and returns the lazy projected sequence.
    pub fn fetch(self) -> EngineResult<ProjectedRows<'a, T>> {
        let compiled = CompiledQuery::compile(
            &self.source.registry,
            T::TYPE_NAME,
            self.predicate.as_ref(),
            Some(&self.shape),
        )?;
        let metadata = self.source.registry.describe(T::TYPE_NAME)?.clone();
        Ok(ProjectedRows::new(self.source, compiled, metadata))
    }
}
