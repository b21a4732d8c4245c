//! Attribute metadata model for arbor.
//!
//! Defines how entity types map onto the directory:
//! - [`TypeMetadata`] — an entity type's directory object class, optional
//!   native-reader tag, and declared properties
//! - [`PropertySpec`] / [`AttributeBinding`] — per-property attribute name
//!   and retrieval channel
//! - [`DirectoryEntity`] — name-based property access implemented by entity
//!   structs, replacing runtime reflection
//! - [`SchemaRegistry`] — the lookup table the compilers and the
//!   materializer resolve against
//!
//! All declarations are registered before any query executes and are pure
//! data; the registry performs lookups only.

mod binding;
mod entity;
mod registry;

pub use binding::{AttributeBinding, Channel, PropertySpec, TypeMetadata};
pub use entity::DirectoryEntity;
pub use registry::SchemaRegistry;

/// Result type alias using the crate's error type.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors that can occur in metadata lookups.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The entity type was never registered.
    #[error("no schema registered for entity type `{0}`")]
    MissingSchema(String),

    /// The property is not declared on the entity type.
    #[error("entity type `{entity_type}` has no property `{property}`")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },
}
