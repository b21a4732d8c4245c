use arbor_types::ValueKind;
use serde::{Deserialize, Serialize};

/// Describes how an entity type maps onto the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// The entity type name queries are keyed by.
    pub entity_type: String,
    /// The directory object class entries of this type carry.
    pub object_class: String,
    /// Tag selecting the native attribute reader for this type, when one
    /// exists. Absent for types served entirely over the protocol channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
    pub properties: Vec<PropertySpec>,
}

impl TypeMetadata {
    /// Looks up a declared property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Resolves the attribute binding for a declared property.
    ///
    /// Properties declared without an explicit binding fall back to their
    /// own name on the protocol channel. Returns `None` for undeclared
    /// properties.
    #[must_use]
    pub fn binding_for(&self, property: &str) -> Option<AttributeBinding> {
        let spec = self.property(property)?;
        Some(spec.binding.clone().unwrap_or(AttributeBinding {
            attribute: spec.name.clone(),
            channel: Channel::Protocol,
        }))
    }
}

/// A declared entity property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub kind: ValueKind,
    /// Explicit attribute binding, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<AttributeBinding>,
}

impl PropertySpec {
    fn simple(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            binding: None,
        }
    }

    /// Shorthand for a text property.
    pub fn text(name: &str) -> Self {
        Self::simple(name, ValueKind::Text)
    }

    /// Shorthand for an integer property.
    pub fn int(name: &str) -> Self {
        Self::simple(name, ValueKind::Int)
    }

    /// Shorthand for a boolean property.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, ValueKind::Bool)
    }

    /// Shorthand for a byte-array property (never multi-valued).
    pub fn bytes(name: &str) -> Self {
        Self::simple(name, ValueKind::Bytes)
    }

    /// Shorthand for a GUID property.
    pub fn guid(name: &str) -> Self {
        Self::simple(name, ValueKind::Guid)
    }

    /// Shorthand for a timestamp property.
    pub fn timestamp(name: &str) -> Self {
        Self::simple(name, ValueKind::Timestamp)
    }

    /// Shorthand for a multi-valued text property.
    pub fn text_list(name: &str) -> Self {
        Self::simple(name, ValueKind::TextList)
    }

    /// Shorthand for a multi-valued integer property.
    pub fn int_list(name: &str) -> Self {
        Self::simple(name, ValueKind::IntList)
    }

    /// Binds the property to a protocol attribute name.
    #[must_use]
    pub fn bound_to(mut self, attribute: &str) -> Self {
        self.binding = Some(AttributeBinding {
            attribute: attribute.into(),
            channel: Channel::Protocol,
        });
        self
    }

    /// Binds the property to a named native-reader attribute.
    #[must_use]
    pub fn via_native(mut self, attribute: &str) -> Self {
        self.binding = Some(AttributeBinding {
            attribute: attribute.into(),
            channel: Channel::NativeReader,
        });
        self
    }
}

/// The declared mapping from an entity property to a directory attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBinding {
    /// The directory attribute name.
    pub attribute: String,
    pub channel: Channel,
}

/// How an attribute's value is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The directory protocol's generic attribute-value collection.
    Protocol,
    /// A platform-specific typed helper on the search result's native
    /// handle. Has no protocol representation, so it cannot appear in
    /// filter strings.
    NativeReader,
}
