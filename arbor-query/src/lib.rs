//! Query compiler for arbor.
//!
//! Turns declarative query trees into a single directory search:
//! - [`Expr`] — the predicate AST over one free entity variable
//! - [`Shape`] — the projection AST reshaping materialized entities
//! - [`CompiledQuery`] — the parse result: filter string, requested
//!   attribute set, and a reusable projection plan
//!
//! Compilation is pure and happens strictly before any directory call; a
//! query tree either compiles completely or the directory is never touched.
//! The grammar is small and fixed, so both compilers are plain recursive
//! walks over tagged enums — no runtime code generation.

mod compiled;
mod expr;
mod filter;
mod projection;

pub use compiled::CompiledQuery;
pub use expr::{lit, prop, ArithOp, CompareOp, Expr, MatchKind};
pub use filter::{compile_predicate, escape_literal};
pub use projection::{Projected, ProjectionPlan, Shape};

use arbor_model::ModelError;

/// Result type alias using the crate's error type.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while compiling or evaluating a query tree.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Metadata lookup failure (unregistered type, undeclared property).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A query-tree node shape neither compiler supports.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// A comparison without exactly one attribute-side operand.
    #[error("comparison must have exactly one attribute operand; {0} sides reference an attribute")]
    InvalidOperand(&'static str),

    /// A native-reader-bound property in filter position. The native
    /// channel has no directory-protocol representation.
    #[error("property `{property}` is bound to the native reader and cannot appear in a filter")]
    UnfilterableProperty { property: String },

    /// A projection plan hit incompatible values at row-evaluation time.
    #[error("projection evaluation failed: {0}")]
    Evaluation(String),
}
