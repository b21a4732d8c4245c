//! Context aggregation tests.

use arbor_engine::mock::MockDirectory;
use arbor_engine::{DirectoryContext, EngineError, RawEntry, TypedSource};
use arbor_model::{
    DirectoryEntity, ModelResult, PropertySpec, SchemaRegistry, TypeMetadata,
};
use arbor_types::{RawValue, SearchScope, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
struct Person {
    name: String,
}

impl DirectoryEntity for Person {
    const TYPE_NAME: &'static str = "person";

    fn set_property(&mut self, name: &str, value: Value) -> ModelResult<()> {
        match name {
            "name" => self.name = value.as_str().unwrap_or_default().to_string(),
            _ => return Err(Self::unknown_property(name)),
        }
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Team {
    name: String,
}

impl DirectoryEntity for Team {
    const TYPE_NAME: &'static str = "team";

    fn set_property(&mut self, name: &str, value: Value) -> ModelResult<()> {
        match name {
            "name" => self.name = value.as_str().unwrap_or_default().to_string(),
            _ => return Err(Self::unknown_property(name)),
        }
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(TypeMetadata {
        entity_type: "person".to_string(),
        object_class: "person".to_string(),
        native_type: None,
        properties: vec![PropertySpec::text("name").bound_to("cn")],
    });
    registry.register(TypeMetadata {
        entity_type: "team".to_string(),
        object_class: "groupOfNames".to_string(),
        native_type: None,
        properties: vec![PropertySpec::text("name").bound_to("cn")],
    });
    Arc::new(registry)
}

const ROOT: &str = "dc=example,dc=com";

fn context() -> (Arc<MockDirectory>, DirectoryContext) {
    let directory = Arc::new(MockDirectory::new());
    let context = DirectoryContext::new(directory.clone(), registry(), ROOT);
    (directory, context)
}

// ── Source slots ─────────────────────────────────────────────────

#[test]
fn sources_inherit_the_context_root_and_default_to_base_scope() {
    let (_, mut ctx) = context();
    ctx.add_source::<Person>("people").unwrap();

    let people = ctx.source::<Person>("people").unwrap();
    assert_eq!(people.base(), ROOT);
    assert_eq!(people.scope(), SearchScope::Base);
}

#[test]
fn sources_accept_an_explicit_scope() {
    let (_, mut ctx) = context();
    ctx.add_source_scoped::<Person>("people", SearchScope::Subtree)
        .unwrap();
    assert_eq!(
        ctx.source::<Person>("people").unwrap().scope(),
        SearchScope::Subtree
    );
}

#[test]
fn source_lookup_is_type_checked() {
    let (_, mut ctx) = context();
    ctx.add_source::<Person>("people").unwrap();

    assert!(matches!(
        ctx.source::<Team>("people").unwrap_err(),
        EngineError::SourceType(name) if name == "people"
    ));
    assert!(matches!(
        ctx.source::<Person>("teams").unwrap_err(),
        EngineError::SourceNotFound(name) if name == "teams"
    ));
}

#[test]
fn duplicate_slot_names_are_rejected() {
    let (_, mut ctx) = context();
    ctx.add_source::<Person>("people").unwrap();

    assert!(matches!(
        ctx.add_source::<Team>("people").unwrap_err(),
        EngineError::DuplicateName(name) if name == "people"
    ));
    assert!(matches!(
        ctx.add_child("people", None).unwrap_err(),
        EngineError::DuplicateName(name) if name == "people"
    ));
}

// ── Child contexts ───────────────────────────────────────────────

#[test]
fn children_resolve_relative_roots_through_the_backend() {
    let (_, mut ctx) = context();
    ctx.add_child("engineering", Some("ou=eng")).unwrap();

    let child = ctx.child("engineering").unwrap();
    assert_eq!(child.root(), "ou=eng,dc=example,dc=com");
}

#[test]
fn children_without_a_relative_path_share_the_root() {
    let (_, mut ctx) = context();
    ctx.add_child("mirror", None).unwrap();
    assert_eq!(ctx.child("mirror").unwrap().root(), ROOT);
}

#[test]
fn child_resolution_failure_wraps_the_backend_error() {
    let (directory, mut ctx) = context();
    directory.fail_child("ou=missing");

    let err = ctx.add_child("ghosts", Some("ou=missing")).unwrap_err();
    let EngineError::ChildResolution { name, source } = err else {
        panic!("expected ChildResolution, got {err}");
    };
    assert_eq!(name, "ghosts");
    assert!(source.to_string().contains("no such object"));
    assert!(ctx.child("ghosts").is_none());
}

#[test]
fn children_nest_recursively() {
    let (_, mut ctx) = context();
    let child = ctx.add_child("engineering", Some("ou=eng")).unwrap();
    child.add_child("compilers", Some("ou=compilers")).unwrap();

    let nested = ctx
        .child("engineering")
        .unwrap()
        .child("compilers")
        .unwrap();
    assert_eq!(nested.root(), "ou=compilers,ou=eng,dc=example,dc=com");
}

// ── Cascading update ─────────────────────────────────────────────

fn mutate_one<T: DirectoryEntity + 'static>(
    source: &TypedSource<T>,
    property: &str,
    value: &str,
) {
    let mut row = source.query().fetch().unwrap().next().unwrap().unwrap();
    row.set(property, value).unwrap();
}

#[test]
fn update_cascades_flush_to_sources_and_children() {
    let (directory, mut ctx) = context();
    directory.add_entry(
        RawEntry::new("cn=a,dc=example,dc=com").with_attribute("cn", [RawValue::from("a")]),
    );

    ctx.add_source_scoped::<Person>("people", SearchScope::Subtree)
        .unwrap();
    let child = ctx.add_child("engineering", Some("ou=eng")).unwrap();
    child
        .add_source_scoped::<Team>("teams", SearchScope::Subtree)
        .unwrap();

    mutate_one(ctx.source::<Person>("people").unwrap(), "name", "b");
    mutate_one(
        ctx.child("engineering")
            .unwrap()
            .source::<Team>("teams")
            .unwrap(),
        "name",
        "c",
    );

    ctx.update().unwrap();

    assert_eq!(directory.commits().len(), 2);
    assert_eq!(ctx.source::<Person>("people").unwrap().pending_changes(), 0);
    assert_eq!(
        ctx.child("engineering")
            .unwrap()
            .source::<Team>("teams")
            .unwrap()
            .pending_changes(),
        0
    );
}

#[test]
fn update_collects_slot_failures() {
    let (directory, mut ctx) = context();
    directory.add_entry(
        RawEntry::new("cn=a,dc=example,dc=com").with_attribute("cn", [RawValue::from("a")]),
    );
    directory.fail_commit("cn=a,dc=example,dc=com");

    ctx.add_source_scoped::<Person>("people", SearchScope::Subtree)
        .unwrap();
    mutate_one(ctx.source::<Person>("people").unwrap(), "name", "b");

    let err = ctx.update().unwrap_err();
    let EngineError::FlushFailed { failures, .. } = err else {
        panic!("expected FlushFailed, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "people");
}
