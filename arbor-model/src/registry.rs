use crate::{AttributeBinding, ModelError, ModelResult, TypeMetadata};
use std::collections::HashMap;

/// The lookup table mapping entity type names to their directory metadata.
///
/// Populated by explicit [`register`](SchemaRegistry::register) calls at
/// startup, before any query executes; read-only afterwards. Lookups have
/// no side effects.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeMetadata>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type's metadata.
    ///
    /// Re-registering a type name replaces the previous metadata.
    pub fn register(&mut self, metadata: TypeMetadata) {
        self.types.insert(metadata.entity_type.clone(), metadata);
    }

    /// Looks up the metadata for an entity type.
    ///
    /// Fails with [`ModelError::MissingSchema`] for types never registered;
    /// queries against such a type must fail before any directory call.
    pub fn describe(&self, entity_type: &str) -> ModelResult<&TypeMetadata> {
        self.types
            .get(entity_type)
            .ok_or_else(|| ModelError::MissingSchema(entity_type.to_string()))
    }

    /// Resolves the attribute binding for a property of an entity type.
    ///
    /// Declared-but-unbound properties fall back to their own name on the
    /// protocol channel; undeclared properties are an error.
    pub fn binding_for(&self, entity_type: &str, property: &str) -> ModelResult<AttributeBinding> {
        let metadata = self.describe(entity_type)?;
        metadata
            .binding_for(property)
            .ok_or_else(|| ModelError::UnknownProperty {
                entity_type: entity_type.to_string(),
                property: property.to_string(),
            })
    }
}
