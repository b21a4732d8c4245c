//! Predicate-to-filter-string compilation.
//!
//! Emits the directory's prefix-notation filter grammar: one parenthesis
//! pair per node, `&`/`|`/`!` combinators, `=`/`>=`/`<=` comparisons.
//! Strict `>` and `<` have no native form and are synthesized as a compound
//! AND-NOT-equal around the corresponding non-strict comparison.

use crate::expr::{ArithOp, CompareOp, Expr, MatchKind};
use crate::{QueryError, QueryResult};
use arbor_model::{Channel, SchemaRegistry};
use arbor_types::{utc_to_filetime, Value};

/// Escapes a literal for embedding into a filter string.
///
/// `\` becomes `\5c`, `(` becomes `\28`, `)` becomes `\29`. Single pass, so
/// each occurrence is escaped exactly once.
#[must_use]
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\5c"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            _ => out.push(c),
        }
    }
    out
}

/// Compiles a predicate tree into a filter string.
///
/// Attribute names resolve through the registry bindings for
/// `entity_type`. Fails — before any directory call — on unsupported node
/// shapes, missing attribute operands, and native-reader-bound properties.
pub fn compile_predicate(
    registry: &SchemaRegistry,
    entity_type: &str,
    expr: &Expr,
) -> QueryResult<String> {
    match expr {
        Expr::And(lhs, rhs) => Ok(format!(
            "(&{}{})",
            compile_predicate(registry, entity_type, lhs)?,
            compile_predicate(registry, entity_type, rhs)?
        )),
        Expr::Or(lhs, rhs) => Ok(format!(
            "(|{}{})",
            compile_predicate(registry, entity_type, lhs)?,
            compile_predicate(registry, entity_type, rhs)?
        )),
        Expr::Not(inner) => Ok(format!(
            "(!{})",
            compile_predicate(registry, entity_type, inner)?
        )),
        Expr::Compare { op, lhs, rhs } => {
            compile_compare(registry, entity_type, *op, lhs, rhs)
        }
        Expr::Matches {
            kind,
            receiver,
            pattern,
        } => compile_match(registry, entity_type, *kind, receiver, pattern),
        other => Err(QueryError::Unsupported(format!(
            "{} in predicate position",
            other.kind_name()
        ))),
    }
}

fn compile_compare(
    registry: &SchemaRegistry,
    entity_type: &str,
    op: CompareOp,
    lhs: &Expr,
    rhs: &Expr,
) -> QueryResult<String> {
    // Exactly one side must reference an attribute; a right-side attribute
    // mirrors the emitted operator.
    let (property, constant, op) = match (lhs, rhs) {
        (Expr::Property(_), Expr::Property(_)) => {
            return Err(QueryError::InvalidOperand("both"));
        }
        (Expr::Property(name), other) => (name, other, op),
        (other, Expr::Property(name)) => (name, other, op.mirrored()),
        _ => return Err(QueryError::InvalidOperand("neither")),
    };

    let attribute = filterable_attribute(registry, entity_type, property)?;
    let value = render_value(&fold_constant(constant)?)?;

    Ok(match op {
        CompareOp::Eq => format!("({attribute}={value})"),
        CompareOp::Ne => format!("(!({attribute}={value}))"),
        CompareOp::Ge => format!("({attribute}>={value})"),
        CompareOp::Le => format!("({attribute}<={value})"),
        CompareOp::Gt => format!("(&({attribute}>={value})(!({attribute}={value})))"),
        CompareOp::Lt => format!("(&({attribute}<={value})(!({attribute}={value})))"),
    })
}

fn compile_match(
    registry: &SchemaRegistry,
    entity_type: &str,
    kind: MatchKind,
    receiver: &Expr,
    pattern: &Expr,
) -> QueryResult<String> {
    let Expr::Property(property) = receiver else {
        return Err(QueryError::Unsupported(format!(
            "string match on {}",
            receiver.kind_name()
        )));
    };

    let attribute = filterable_attribute(registry, entity_type, property)?;
    let folded = fold_constant(pattern)?;
    let Some(text) = folded.as_str() else {
        return Err(QueryError::Unsupported(
            "string match pattern must be a text constant".into(),
        ));
    };
    let value = escape_literal(text);

    Ok(match kind {
        MatchKind::Contains => format!("({attribute}=*{value}*)"),
        MatchKind::StartsWith => format!("({attribute}={value}*)"),
        MatchKind::EndsWith => format!("({attribute}=*{value})"),
    })
}

/// Resolves a property to its protocol attribute name for filter position.
fn filterable_attribute(
    registry: &SchemaRegistry,
    entity_type: &str,
    property: &str,
) -> QueryResult<String> {
    let binding = registry.binding_for(entity_type, property)?;
    if binding.channel == Channel::NativeReader {
        return Err(QueryError::UnfilterableProperty {
            property: property.to_string(),
        });
    }
    Ok(binding.attribute)
}

/// Evaluates a constant subexpression at compile time.
///
/// Literals evaluate to themselves; integer arithmetic over constants is
/// folded. Anything else cannot be embedded into a filter.
fn fold_constant(expr: &Expr) -> QueryResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Arith { op, lhs, rhs } => {
            let (Some(a), Some(b)) = (
                fold_constant(lhs).ok().and_then(|v| v.as_int()),
                fold_constant(rhs).ok().and_then(|v| v.as_int()),
            ) else {
                return Err(QueryError::Unsupported(
                    "arithmetic over non-constant operands".into(),
                ));
            };
            let folded = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Sub => a.checked_sub(b),
                ArithOp::Mul => a.checked_mul(b),
                ArithOp::Div => a.checked_div(b),
            };
            folded.map(Value::Int).ok_or_else(|| {
                QueryError::Unsupported("arithmetic constant overflow".into())
            })
        }
        other => Err(QueryError::Unsupported(format!(
            "{} where a constant operand is required",
            other.kind_name()
        ))),
    }
}

/// Renders a constant value in filter syntax, escaping where applicable.
fn render_value(value: &Value) -> QueryResult<String> {
    match value {
        Value::Text(s) => Ok(escape_literal(s)),
        Value::Int(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("TRUE".into()),
        Value::Bool(false) => Ok("FALSE".into()),
        Value::Bytes(bytes) => Ok(render_bytes(bytes)),
        Value::Guid(guid) => Ok(render_bytes(guid.as_bytes())),
        Value::Timestamp(ts) => {
            let (high, low) = utc_to_filetime(*ts);
            Ok((((high as i64) << 32) | (low as i64)).to_string())
        }
        Value::Null | Value::List(_) => Err(QueryError::Unsupported(format!(
            "{value:?} as a filter constant"
        ))),
    }
}

/// Binary values embed as one escaped hex pair per byte.
fn render_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        out.push_str(&format!("\\{b:02x}"));
    }
    out
}
