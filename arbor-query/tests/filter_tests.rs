use arbor_model::{PropertySpec, SchemaRegistry, TypeMetadata};
use arbor_query::{compile_predicate, lit, prop, Expr, QueryError};
use pretty_assertions::assert_eq;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(TypeMetadata {
        entity_type: "user".to_string(),
        object_class: "person".to_string(),
        native_type: Some("IadsUser".to_string()),
        properties: vec![
            PropertySpec::text("name").bound_to("cn"),
            PropertySpec::int("age"),
            PropertySpec::bool("enabled").bound_to("isEnabled"),
            PropertySpec::guid("id").bound_to("objectGUID"),
            PropertySpec::timestamp("changed").bound_to("whenChanged"),
            PropertySpec::text("badge").via_native("BadgeNumber"),
        ],
    });
    registry
}

fn compile(expr: Expr) -> String {
    compile_predicate(&registry(), "user", &expr).unwrap()
}

fn compile_err(expr: Expr) -> QueryError {
    compile_predicate(&registry(), "user", &expr).unwrap_err()
}

// ── Comparisons ──────────────────────────────────────────────────

#[test]
fn equality_uses_bound_attribute() {
    assert_eq!(compile(prop("name").eq("X")), "(cn=X)");
}

#[test]
fn inequality_wraps_negation() {
    assert_eq!(compile(prop("name").ne("X")), "(!(cn=X))");
}

#[test]
fn equality_is_order_independent() {
    assert_eq!(compile(lit("X").eq(prop("name"))), "(cn=X)");
    assert_eq!(compile(lit("X").ne(prop("name"))), "(!(cn=X))");
}

#[test]
fn non_strict_ordering() {
    assert_eq!(compile(prop("age").ge(5)), "(age>=5)");
    assert_eq!(compile(prop("age").le(5)), "(age<=5)");
}

#[test]
fn strict_greater_synthesized() {
    assert_eq!(compile(prop("age").gt(5)), "(&(age>=5)(!(age=5)))");
}

#[test]
fn strict_less_synthesized() {
    assert_eq!(compile(prop("age").lt(5)), "(&(age<=5)(!(age=5)))");
}

#[test]
fn reversed_operands_mirror_the_operator() {
    // 5 < age means age > 5
    assert_eq!(compile(lit(5).lt(prop("age"))), "(&(age>=5)(!(age=5)))");
    // 5 >= age means age <= 5
    assert_eq!(compile(lit(5).ge(prop("age"))), "(age<=5)");
}

#[test]
fn guid_literals_render_as_escaped_bytes() {
    let id = uuid::Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
    assert_eq!(
        compile(prop("id").eq(arbor_types::Value::Guid(id))),
        "(objectGUID=\\00\\11\\22\\33\\44\\55\\66\\77\\88\\99\\aa\\bb\\cc\\dd\\ee\\ff)"
    );
}

#[test]
fn timestamp_literals_render_as_tick_counts() {
    // 2020-09-13T12:26:40Z in 100ns ticks since 1601-01-01
    let ts = chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap();
    assert_eq!(
        compile(prop("changed").ge(arbor_types::Value::Timestamp(ts))),
        "(whenChanged>=132444736000000000)"
    );
}

#[test]
fn boolean_literals_render_uppercase() {
    assert_eq!(compile(prop("enabled").eq(true)), "(isEnabled=TRUE)");
    assert_eq!(compile(prop("enabled").eq(false)), "(isEnabled=FALSE)");
}

// ── Combinators ──────────────────────────────────────────────────

#[test]
fn conjunction() {
    let expr = prop("name").eq("v1").and(prop("age").eq(3));
    assert_eq!(compile(expr), "(&(cn=v1)(age=3))");
}

#[test]
fn disjunction() {
    let expr = prop("name").eq("a").or(prop("name").eq("b"));
    assert_eq!(compile(expr), "(|(cn=a)(cn=b))");
}

#[test]
fn negation() {
    assert_eq!(compile(!prop("name").eq("X")), "(!(cn=X))");
}

#[test]
fn nested_combinators_stay_balanced() {
    let expr = prop("name").eq("a").and(prop("age").ge(2).or(!prop("enabled").eq(true)));
    let filter = compile(expr);
    assert_eq!(filter, "(&(cn=a)(|(age>=2)(!(isEnabled=TRUE))))");
    let open = filter.matches('(').count();
    let close = filter.matches(')').count();
    assert_eq!(open, close);
}

// ── String operators ─────────────────────────────────────────────

#[test]
fn contains_wraps_wildcards() {
    assert_eq!(compile(prop("name").contains("art")), "(cn=*art*)");
}

#[test]
fn starts_with_trailing_wildcard() {
    assert_eq!(compile(prop("name").starts_with("Ba")), "(cn=Ba*)");
}

#[test]
fn ends_with_leading_wildcard() {
    assert_eq!(compile(prop("name").ends_with("rt")), "(cn=*rt)");
}

#[test]
fn match_pattern_must_be_text() {
    let err = compile_err(prop("name").contains(5));
    assert!(matches!(err, QueryError::Unsupported(_)));
}

#[test]
fn match_receiver_must_be_a_property() {
    let err = compile_err(lit("abc").contains("b"));
    assert!(matches!(err, QueryError::Unsupported(_)));
}

// ── Escaping ─────────────────────────────────────────────────────

#[test]
fn special_characters_escaped_once() {
    assert_eq!(compile(prop("name").eq("a(b)c\\")), "(cn=a\\28b\\29c\\5c)");
}

#[test]
fn escaping_applies_to_match_patterns() {
    assert_eq!(compile(prop("name").contains("(x)")), "(cn=*\\28x\\29*)");
}

// ── Constant folding ─────────────────────────────────────────────

#[test]
fn integer_arithmetic_folds_in_operand_position() {
    assert_eq!(compile(prop("age").ge(lit(2).add(3))), "(age>=5)");
}

// ── Failure modes ────────────────────────────────────────────────

#[test]
fn arithmetic_in_predicate_position_unsupported() {
    let err = compile_err(lit(1).add(2));
    assert!(matches!(err, QueryError::Unsupported(msg) if msg.contains("arithmetic")));
}

#[test]
fn bare_property_in_predicate_position_unsupported() {
    assert!(matches!(compile_err(prop("enabled")), QueryError::Unsupported(_)));
}

#[test]
fn comparison_needs_exactly_one_attribute_side() {
    let both = compile_err(prop("name").eq(prop("name")));
    assert!(matches!(both, QueryError::InvalidOperand("both")));

    let neither = compile_err(lit("a").eq("b"));
    assert!(matches!(neither, QueryError::InvalidOperand("neither")));
}

#[test]
fn native_bound_property_is_unfilterable() {
    let err = compile_err(prop("badge").eq("B-1"));
    assert!(matches!(
        err,
        QueryError::UnfilterableProperty { property } if property == "badge"
    ));
}

#[test]
fn undeclared_property_fails() {
    let err = compile_err(prop("missing").eq("x"));
    assert!(matches!(err, QueryError::Model(_)));
}

#[test]
fn filter_values_never_contain_raw_parentheses() {
    let filter = compile(prop("name").eq(")(objectClass=*)"));
    assert_eq!(filter, "(cn=\\29\\28objectClass=*\\29)");
}
