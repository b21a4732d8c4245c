//! The predicate expression tree.
//!
//! An [`Expr`] describes a boolean condition over a single entity variable.
//! The tree is deliberately wider than what the filter compiler accepts —
//! arithmetic nodes exist so that literal subexpressions can be folded at
//! compile time, and so that unsupported shapes fail with a descriptive
//! error instead of being unrepresentable.

use arbor_types::Value;

/// A node in the predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A property access on the query's entity variable.
    Property(String),
    /// A constant.
    Literal(Value),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A string operator: `receiver` must resolve to an attribute, the
    /// pattern to a text constant.
    Matches {
        kind: MatchKind,
        receiver: Box<Expr>,
        pattern: Box<Expr>,
    },
    /// Arithmetic. Foldable when both sides are integer constants; never
    /// valid in predicate position.
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl CompareOp {
    /// The operator to emit when the attribute sits on the right-hand side
    /// of the comparison. Equality and inequality are order-independent.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Eq | CompareOp::Ne => self,
        }
    }
}

/// String matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Contains,
    StartsWith,
    EndsWith,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Builds a property-access node.
pub fn prop(name: &str) -> Expr {
    Expr::Property(name.into())
}

/// Builds a literal node.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn matches(kind: MatchKind, receiver: Expr, pattern: Expr) -> Expr {
        Expr::Matches {
            kind,
            receiver: Box::new(receiver),
            pattern: Box::new(pattern),
        }
    }

    /// `self == other`
    #[must_use]
    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Eq, self, other.into())
    }

    /// `self != other`
    #[must_use]
    pub fn ne(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Ne, self, other.into())
    }

    /// `self >= other`
    #[must_use]
    pub fn ge(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Ge, self, other.into())
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Gt, self, other.into())
    }

    /// `self <= other`
    #[must_use]
    pub fn le(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Le, self, other.into())
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        Expr::compare(CompareOp::Lt, self, other.into())
    }

    /// Substring match: `attr=*pattern*`
    #[must_use]
    pub fn contains(self, pattern: impl Into<Expr>) -> Expr {
        Expr::matches(MatchKind::Contains, self, pattern.into())
    }

    /// Prefix match: `attr=pattern*`
    #[must_use]
    pub fn starts_with(self, pattern: impl Into<Expr>) -> Expr {
        Expr::matches(MatchKind::StartsWith, self, pattern.into())
    }

    /// Suffix match: `attr=*pattern`
    #[must_use]
    pub fn ends_with(self, pattern: impl Into<Expr>) -> Expr {
        Expr::matches(MatchKind::EndsWith, self, pattern.into())
    }

    /// Boolean conjunction.
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// Boolean disjunction.
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// Integer addition; foldable only over constants.
    #[must_use]
    pub fn add(self, other: impl Into<Expr>) -> Expr {
        Expr::Arith {
            op: ArithOp::Add,
            lhs: Box::new(self),
            rhs: Box::new(other.into()),
        }
    }

    /// A short name for the node kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Property(_) => "property access",
            Expr::Literal(_) => "literal",
            Expr::Not(_) => "negation",
            Expr::And(_, _) => "conjunction",
            Expr::Or(_, _) => "disjunction",
            Expr::Compare { .. } => "comparison",
            Expr::Matches { .. } => "string match",
            Expr::Arith { .. } => "arithmetic",
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Literal(n.into())
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Literal(n.into())
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(b.into())
    }
}
