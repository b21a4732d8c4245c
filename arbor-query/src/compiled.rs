//! The immutable result of parsing a query tree.

use crate::filter::compile_predicate;
use crate::projection::{ProjectionPlan, Shape};
use crate::{Expr, QueryResult};
use arbor_model::{Channel, ModelError, SchemaRegistry};
use std::collections::BTreeSet;
use tracing::debug;

/// A fully parsed query: filter string, requested attribute set, and the
/// optional projection plan. Built once per query tree, immutable
/// thereafter, and discarded after materialization completes.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    entity_type: String,
    object_class: String,
    filter: Option<String>,
    properties: Vec<String>,
    attributes: Vec<String>,
    plan: Option<ProjectionPlan>,
}

impl CompiledQuery {
    /// Parses a predicate and a projection against an entity type.
    ///
    /// All compile-stage failures happen here, strictly before any
    /// directory call: a missing schema, an unsupported node shape, a
    /// misplaced operand, or a native-bound property in filter position.
    pub fn compile(
        registry: &SchemaRegistry,
        entity_type: &str,
        predicate: Option<&Expr>,
        shape: Option<&Shape>,
    ) -> QueryResult<Self> {
        let metadata = registry.describe(entity_type)?;

        let filter = predicate
            .map(|expr| compile_predicate(registry, entity_type, expr))
            .transpose()?;

        // Identity projection requests every declared property; an explicit
        // shape requests exactly the properties it references.
        let (properties, plan) = match shape {
            None | Some(Shape::Identity) => (
                metadata
                    .properties
                    .iter()
                    .map(|spec| spec.name.clone())
                    .collect::<Vec<_>>(),
                None,
            ),
            Some(explicit) => {
                let mut referenced = BTreeSet::new();
                explicit.referenced_properties(&mut referenced);

                let mut properties = Vec::new();
                for spec in &metadata.properties {
                    if referenced.remove(&spec.name) {
                        properties.push(spec.name.clone());
                    }
                }
                if let Some(unknown) = referenced.into_iter().next() {
                    return Err(ModelError::UnknownProperty {
                        entity_type: entity_type.to_string(),
                        property: unknown,
                    }
                    .into());
                }
                (properties, Some(ProjectionPlan::new(explicit.clone())))
            }
        };

        // The wire request carries protocol-channel attributes only;
        // native-reader properties are resolved by the materializer
        // directly against the row's native handle.
        let mut attributes = Vec::new();
        for name in &properties {
            if let Some(binding) = metadata.binding_for(name) {
                if binding.channel == Channel::Protocol && !attributes.contains(&binding.attribute)
                {
                    attributes.push(binding.attribute);
                }
            }
        }

        let compiled = Self {
            entity_type: entity_type.to_string(),
            object_class: metadata.object_class.clone(),
            filter,
            properties,
            attributes,
            plan,
        };
        debug!(
            entity_type,
            filter = compiled.filter.as_deref().unwrap_or(""),
            attributes = compiled.attributes.len(),
            "compiled query"
        );
        Ok(compiled)
    }

    /// The entity type the query targets.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The compiled predicate filter, if the query had one.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// The final filter sent to the directory: the object-class filter,
    /// AND-combined with the predicate filter when one exists.
    #[must_use]
    pub fn final_filter(&self) -> String {
        match &self.filter {
            Some(predicate) => format!("(&(objectClass={}){})", self.object_class, predicate),
            None => format!("(objectClass={})", self.object_class),
        }
    }

    /// The properties the materializer populates, in declared order.
    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// The protocol attribute names requested from the directory.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The projection plan, absent for identity projections.
    #[must_use]
    pub fn plan(&self) -> Option<&ProjectionPlan> {
        self.plan.as_ref()
    }
}
