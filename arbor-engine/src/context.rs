//! Directory context aggregation.
//!
//! A [`DirectoryContext`] is a container of named typed sources and nested
//! sub-contexts, each wired to an appropriately scoped search root under
//! the context's own root. `update` cascades flushes across everything the
//! context discovered.

use crate::backend::{DirectoryBackend, NativeReader};
use crate::source::TypedSource;
use crate::{EngineError, EngineResult};
use arbor_model::{DirectoryEntity, SchemaRegistry};
use arbor_types::SearchScope;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Type-erased view of a typed source slot.
trait ContextSource: Send + Sync {
    fn flush_source(&self) -> EngineResult<()>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: DirectoryEntity + 'static> ContextSource for TypedSource<T> {
    fn flush_source(&self) -> EngineResult<()> {
        self.flush()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A container of typed sources and nested sub-contexts sharing one
/// backend, native reader, and registry.
pub struct DirectoryContext {
    backend: Arc<dyn DirectoryBackend>,
    reader: Option<Arc<dyn NativeReader>>,
    registry: Arc<SchemaRegistry>,
    root: String,
    sources: BTreeMap<String, Box<dyn ContextSource>>,
    children: BTreeMap<String, DirectoryContext>,
}

impl std::fmt::Debug for DirectoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryContext")
            .field("root", &self.root)
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DirectoryContext {
    /// Creates a context rooted at a DN.
    pub fn new(
        backend: Arc<dyn DirectoryBackend>,
        registry: Arc<SchemaRegistry>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            reader: None,
            registry,
            root: root.into(),
            sources: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Attaches the native attribute reader, shared by every source and
    /// child declared afterwards.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn NativeReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// The context's search root DN.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Declares a typed source at the default (base) scope.
    pub fn add_source<T: DirectoryEntity + 'static>(&mut self, name: &str) -> EngineResult<()> {
        self.add_source_scoped::<T>(name, SearchScope::default())
    }

    /// Declares a typed source at an explicit scope.
    pub fn add_source_scoped<T: DirectoryEntity + 'static>(
        &mut self,
        name: &str,
        scope: SearchScope,
    ) -> EngineResult<()> {
        self.check_name(name)?;
        let mut source = TypedSource::<T>::new(
            self.backend.clone(),
            self.registry.clone(),
            self.root.clone(),
            scope,
        );
        if let Some(reader) = &self.reader {
            source = source.with_reader(reader.clone());
        }
        debug!(name, entity_type = T::TYPE_NAME, root = %self.root, "source declared");
        self.sources.insert(name.to_string(), Box::new(source));
        Ok(())
    }

    /// Declares a nested sub-context.
    ///
    /// With a relative path, the child root resolves through the backend
    /// under this context's root; resolution failure wraps the backend
    /// error. Without one, the child shares this context's root.
    pub fn add_child(
        &mut self,
        name: &str,
        relative: Option<&str>,
    ) -> EngineResult<&mut DirectoryContext> {
        self.check_name(name)?;
        let root = match relative {
            Some(rdn) => self.backend.resolve_child(&self.root, rdn).map_err(|err| {
                EngineError::ChildResolution {
                    name: name.to_string(),
                    source: err,
                }
            })?,
            None => self.root.clone(),
        };

        let mut child = DirectoryContext::new(self.backend.clone(), self.registry.clone(), root);
        child.reader = self.reader.clone();
        debug!(name, root = %child.root, "child context declared");
        Ok(self
            .children
            .entry(name.to_string())
            .or_insert(child))
    }

    /// Looks up a declared typed source.
    pub fn source<T: DirectoryEntity + 'static>(&self, name: &str) -> EngineResult<&TypedSource<T>> {
        let slot = self
            .sources
            .get(name)
            .ok_or_else(|| EngineError::SourceNotFound(name.to_string()))?;
        slot.as_any()
            .downcast_ref::<TypedSource<T>>()
            .ok_or_else(|| EngineError::SourceType(name.to_string()))
    }

    /// Looks up a nested sub-context.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DirectoryContext> {
        self.children.get(name)
    }

    /// Cascades flush across every declared source, then recursively into
    /// every child context.
    ///
    /// Slots are processed independently, like ledger entries during a
    /// flush: failures are collected per slot name and reported together.
    pub fn update(&self) -> EngineResult<()> {
        let attempted = self.sources.len() + self.children.len();
        let mut failures = Vec::new();

        for (name, source) in &self.sources {
            if let Err(err) = source.flush_source() {
                failures.push((name.clone(), err.to_string()));
            }
        }
        for (name, child) in &self.children {
            if let Err(err) = child.update() {
                failures.push((name.clone(), err.to_string()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::FlushFailed {
                attempted,
                failures,
            })
        }
    }

    fn check_name(&self, name: &str) -> EngineResult<()> {
        if self.sources.contains_key(name) || self.children.contains_key(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}
