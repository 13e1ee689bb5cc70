//! Expression AST for projections, grouping and ordering terms.
//!
//! Expressions are storage-agnostic: columns are bound to join aliases, not
//! tables, and functions are named rather than rendered for a dialect.

use std::fmt;

// =============================================================================
// Expression AST
// =============================================================================

/// A query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A field read through a join alias: `binding.field`
    Column { binding: String, field: String },

    /// Reference to an output column by name (a projected or derived alias).
    Alias(String),

    /// Literal values
    Literal(Literal),

    /// Function call: name(args...)
    Function { name: String, args: Vec<Expr> },
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column { binding, field } => write!(f, "{}.{}", binding, field),
            Expr::Alias(name) => write!(f, "@{}", name),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Column bound to a join alias.
pub fn column(binding: &str, field: &str) -> Expr {
    Expr::Column {
        binding: binding.into(),
        field: field.into(),
    }
}

/// Reference to an output alias.
pub fn alias(name: &str) -> Expr {
    Expr::Alias(name.into())
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Generic function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
    }
}

pub fn count(expr: Expr) -> Expr {
    func("count", vec![expr])
}

pub fn sum(expr: Expr) -> Expr {
    func("sum", vec![expr])
}

pub fn avg(expr: Expr) -> Expr {
    func("avg", vec![expr])
}

pub fn min(expr: Expr) -> Expr {
    func("min", vec![expr])
}

pub fn max(expr: Expr) -> Expr {
    func("max", vec![expr])
}
