use crate::{ModelError, ModelResult};
use arbor_types::Value;

/// Name-based property access for directory-mapped entity structs.
///
/// Implementations are mechanical: match on the property name and get/set
/// the corresponding field as a [`Value`]. Together with a registered
/// [`TypeMetadata`](crate::TypeMetadata) this replaces runtime reflection —
/// the materializer populates instances and the projection interpreter
/// reads them purely through this trait.
pub trait DirectoryEntity: Default {
    /// The entity type name this struct is registered under.
    const TYPE_NAME: &'static str;

    /// Sets a property from a decoded attribute value.
    ///
    /// Returns [`ModelError::UnknownProperty`] for names not declared on
    /// the type.
    fn set_property(&mut self, name: &str, value: Value) -> ModelResult<()>;

    /// Reads a property as a [`Value`], or `None` for undeclared names.
    fn property(&self, name: &str) -> Option<Value>;

    /// Convenience for implementations rejecting an undeclared name.
    fn unknown_property(name: &str) -> ModelError {
        ModelError::UnknownProperty {
            entity_type: Self::TYPE_NAME.to_string(),
            property: name.to_string(),
        }
    }
}
