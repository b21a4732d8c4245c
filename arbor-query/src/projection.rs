//! Projection analysis and evaluation.
//!
//! A [`Shape`] describes how each materialized entity is reshaped before
//! being yielded. The analyzer walks the shape once per query, collecting
//! every referenced source property; the resulting [`ProjectionPlan`] is
//! then evaluated once per result row by a recursive interpreter.

use crate::expr::{ArithOp, CompareOp, Expr, MatchKind};
use crate::{QueryError, QueryResult};
use arbor_model::DirectoryEntity;
use arbor_types::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A result-shaping tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Yield the populated entity itself.
    Identity,
    /// Construct a record of named bindings.
    Record(Vec<(String, Shape)>),
    /// Construct a list.
    List(Vec<Shape>),
    /// A conditional between two shapes.
    Cond {
        test: Expr,
        then: Box<Shape>,
        otherwise: Box<Shape>,
    },
    /// Evaluate an expression over the source entity.
    Expr(Expr),
}

impl Shape {
    /// Shorthand for projecting a single source property.
    #[must_use]
    pub fn field(name: &str) -> Shape {
        Shape::Expr(Expr::Property(name.into()))
    }

    /// Shorthand for a record of source properties, each keyed by its own
    /// name.
    #[must_use]
    pub fn record<const N: usize>(names: [&str; N]) -> Shape {
        Shape::Record(
            names
                .iter()
                .map(|n| ((*n).to_string(), Shape::field(n)))
                .collect(),
        )
    }

    /// Collects every source property the shape references.
    pub(crate) fn referenced_properties(&self, out: &mut BTreeSet<String>) {
        match self {
            Shape::Identity => {}
            Shape::Record(fields) => {
                for (_, shape) in fields {
                    shape.referenced_properties(out);
                }
            }
            Shape::List(items) => {
                for shape in items {
                    shape.referenced_properties(out);
                }
            }
            Shape::Cond {
                test,
                then,
                otherwise,
            } => {
                collect_expr(test, out);
                then.referenced_properties(out);
                otherwise.referenced_properties(out);
            }
            Shape::Expr(expr) => collect_expr(expr, out),
        }
    }
}

/// Walks every expression node kind that can reference a source member.
fn collect_expr(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Property(name) => {
            out.insert(name.clone());
        }
        Expr::Literal(_) => {}
        Expr::Not(inner) => collect_expr(inner, out),
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            collect_expr(lhs, out);
            collect_expr(rhs, out);
        }
        Expr::Compare { lhs, rhs, .. } | Expr::Arith { lhs, rhs, .. } => {
            collect_expr(lhs, out);
            collect_expr(rhs, out);
        }
        Expr::Matches {
            receiver, pattern, ..
        } => {
            collect_expr(receiver, out);
            collect_expr(pattern, out);
        }
    }
}

/// A projected result value: a plain value, a constructed record, or a
/// constructed list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projected {
    Value(Value),
    Record(BTreeMap<String, Projected>),
    List(Vec<Projected>),
}

impl Projected {
    /// Extracts a plain value.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Projected::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a record field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Projected> {
        match self {
            Projected::Record(fields) => fields.get(field),
            _ => None,
        }
    }
}

/// The reusable transform captured once per query and applied once per row.
#[derive(Debug, Clone)]
pub struct ProjectionPlan {
    shape: Shape,
}

impl ProjectionPlan {
    pub(crate) fn new(shape: Shape) -> Self {
        Self { shape }
    }

    /// Applies the plan to a populated entity.
    pub fn apply<T: DirectoryEntity>(&self, entity: &T) -> QueryResult<Projected> {
        eval_shape(&self.shape, entity)
    }
}

fn eval_shape<T: DirectoryEntity>(shape: &Shape, entity: &T) -> QueryResult<Projected> {
    match shape {
        // Identity is handled by the caller yielding the entity itself;
        // a nested Identity has nothing to construct.
        Shape::Identity => Ok(Projected::Record(BTreeMap::new())),
        Shape::Record(fields) => {
            let mut out = BTreeMap::new();
            for (name, field_shape) in fields {
                out.insert(name.clone(), eval_shape(field_shape, entity)?);
            }
            Ok(Projected::Record(out))
        }
        Shape::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval_shape(item, entity)?);
            }
            Ok(Projected::List(out))
        }
        Shape::Cond {
            test,
            then,
            otherwise,
        } => {
            if eval_bool(test, entity)? {
                eval_shape(then, entity)
            } else {
                eval_shape(otherwise, entity)
            }
        }
        Shape::Expr(expr) => Ok(Projected::Value(eval_expr(expr, entity)?)),
    }
}

fn eval_bool<T: DirectoryEntity>(expr: &Expr, entity: &T) -> QueryResult<bool> {
    match eval_expr(expr, entity)? {
        Value::Bool(b) => Ok(b),
        other => Err(QueryError::Evaluation(format!(
            "expected a boolean condition, got {other:?}"
        ))),
    }
}

/// The row-time interpreter for projection expressions.
fn eval_expr<T: DirectoryEntity>(expr: &Expr, entity: &T) -> QueryResult<Value> {
    match expr {
        Expr::Property(name) => Ok(entity.property(name).unwrap_or(Value::Null)),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Not(inner) => match eval_expr(inner, entity)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(QueryError::Evaluation(format!(
                "negation of non-boolean {other:?}"
            ))),
        },
        Expr::And(lhs, rhs) => Ok(Value::Bool(
            eval_bool(lhs, entity)? && eval_bool(rhs, entity)?,
        )),
        Expr::Or(lhs, rhs) => Ok(Value::Bool(
            eval_bool(lhs, entity)? || eval_bool(rhs, entity)?,
        )),
        Expr::Compare { op, lhs, rhs } => {
            let a = eval_expr(lhs, entity)?;
            let b = eval_expr(rhs, entity)?;
            eval_compare(*op, &a, &b)
        }
        Expr::Matches {
            kind,
            receiver,
            pattern,
        } => {
            let text = eval_expr(receiver, entity)?;
            let pat = eval_expr(pattern, entity)?;
            match (text.as_str(), pat.as_str()) {
                (Some(t), Some(p)) => Ok(Value::Bool(match kind {
                    MatchKind::Contains => t.contains(p),
                    MatchKind::StartsWith => t.starts_with(p),
                    MatchKind::EndsWith => t.ends_with(p),
                })),
                _ => Err(QueryError::Evaluation(
                    "string match over non-text values".into(),
                )),
            }
        }
        Expr::Arith { op, lhs, rhs } => {
            let a = eval_expr(lhs, entity)?;
            let b = eval_expr(rhs, entity)?;
            match (a.as_int(), b.as_int()) {
                (Some(a), Some(b)) => {
                    let result = match op {
                        ArithOp::Add => a.checked_add(b),
                        ArithOp::Sub => a.checked_sub(b),
                        ArithOp::Mul => a.checked_mul(b),
                        ArithOp::Div => a.checked_div(b),
                    };
                    result.map(Value::Int).ok_or_else(|| {
                        QueryError::Evaluation("integer overflow in projection".into())
                    })
                }
                _ => Err(QueryError::Evaluation(
                    "arithmetic over non-integer values".into(),
                )),
            }
        }
    }
}

fn eval_compare(op: CompareOp, a: &Value, b: &Value) -> QueryResult<Value> {
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.partial_cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.partial_cmp(y),
        _ => None,
    };

    match op {
        CompareOp::Eq => Ok(Value::Bool(a == b)),
        CompareOp::Ne => Ok(Value::Bool(a != b)),
        _ => {
            let Some(ord) = ordering else {
                return Err(QueryError::Evaluation(format!(
                    "cannot order {a:?} against {b:?}"
                )));
            };
            Ok(Value::Bool(match op {
                CompareOp::Ge => ord.is_ge(),
                CompareOp::Gt => ord.is_gt(),
                CompareOp::Le => ord.is_le(),
                CompareOp::Lt => ord.is_lt(),
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            }))
        }
    }
}
