//! Path specifications - caller input naming a field through an association chain.

use std::collections::BTreeMap;
use std::fmt;

use crate::query::{Literal, SortDir};

/// What an operation should target.
///
/// One closed sum type covers every request shape; accumulators match on it
/// instead of probing input shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSpec {
    /// A bare field name on the root entity.
    Field(String),
    /// Association names terminated by a field name.
    Path(Vec<String>),
    /// Direction-tagged wrapper (used by sorting).
    Directional(SortDir, Box<PathSpec>),
    /// A derived (function or fragment) expression over a source path.
    Derived(DerivedSpec),
}

impl PathSpec {
    pub fn field(name: &str) -> Self {
        PathSpec::Field(name.into())
    }

    pub fn path<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        PathSpec::Path(segments.into_iter().map(Into::into).collect())
    }

    /// Convenience for a list of bare fields.
    pub fn fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<PathSpec> {
        names.into_iter().map(PathSpec::field).collect()
    }

    pub fn asc(self) -> Self {
        PathSpec::Directional(SortDir::Asc, Box::new(self))
    }

    pub fn desc(self) -> Self {
        PathSpec::Directional(SortDir::Desc, Box::new(self))
    }

    /// Expand a nested list under an association into flat specs.
    ///
    /// `nested("author", [name, email])` yields `[author, name]` and
    /// `[author, email]`. Wrappers and derived sources are prefixed in place.
    pub fn nested(
        association: &str,
        children: impl IntoIterator<Item = PathSpec>,
    ) -> Vec<PathSpec> {
        children
            .into_iter()
            .map(|child| child.under(association))
            .collect()
    }

    /// This spec, reached through one more leading association.
    pub fn under(self, association: &str) -> PathSpec {
        match self {
            PathSpec::Field(name) => PathSpec::Path(vec![association.into(), name]),
            PathSpec::Path(mut segments) => {
                segments.insert(0, association.into());
                PathSpec::Path(segments)
            }
            PathSpec::Directional(dir, inner) => {
                PathSpec::Directional(dir, Box::new(inner.under(association)))
            }
            PathSpec::Derived(mut derived) => {
                derived.source = Box::new(derived.source.under(association));
                PathSpec::Derived(derived)
            }
        }
    }

    /// The named segments this spec walks, root first.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            PathSpec::Field(name) => vec![name.as_str()],
            PathSpec::Path(segments) => segments.iter().map(|s| s.as_str()).collect(),
            PathSpec::Directional(_, inner) => inner.segments(),
            PathSpec::Derived(derived) => derived.source.segments(),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, PathSpec::Derived(_))
    }
}

impl From<&str> for PathSpec {
    fn from(name: &str) -> Self {
        PathSpec::field(name)
    }
}

impl From<DerivedSpec> for PathSpec {
    fn from(derived: DerivedSpec) -> Self {
        PathSpec::Derived(derived)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSpec::Directional(dir, inner) => write!(f, "{} {}", inner, dir),
            PathSpec::Derived(derived) => write!(f, "{}({})", derived.function, derived.source),
            _ => write!(f, "{}", self.segments().join(".")),
        }
    }
}

// =============================================================================
// Derived expressions
// =============================================================================

/// How a derived expression names its function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionRef {
    /// Symbolic identifier, e.g. `upper`.
    Named(String),
    /// Literal template string, e.g. `upper(?)`.
    Fragment(String),
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionRef::Named(name) => write!(f, "{}", name),
            FunctionRef::Fragment(fragment) => write!(f, "fragment \"{}\"", fragment),
        }
    }
}

/// A parameter value supplied to a derived expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Param {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Param::Int(n) => Some(*n as f64),
            Param::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Param::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_literal(&self) -> Literal {
        match self {
            Param::Int(n) => Literal::Int(*n),
            Param::Float(n) => Literal::Float(*n),
            Param::String(s) => Literal::String(s.clone()),
            Param::Bool(b) => Literal::Bool(*b),
        }
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Int(n)
    }
}

impl From<f64> for Param {
    fn from(n: f64) -> Self {
        Param::Float(n)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::String(s.into())
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Param::Bool(b)
    }
}

/// `{source path, output alias, function|fragment, params}`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct DerivedSpec {
    pub source: Box<PathSpec>,
    /// Output name. Required; a missing alias is a recoverable error.
    pub alias: Option<String>,
    pub function: FunctionRef,
    pub params: BTreeMap<String, Param>,
}

impl DerivedSpec {
    pub fn function(source: impl Into<PathSpec>, name: &str) -> Self {
        Self::new(source.into(), FunctionRef::Named(name.into()))
    }

    pub fn fragment(source: impl Into<PathSpec>, template: &str) -> Self {
        Self::new(source.into(), FunctionRef::Fragment(template.into()))
    }

    fn new(source: PathSpec, function: FunctionRef) -> Self {
        Self {
            source: Box::new(source),
            alias: None,
            function,
            params: BTreeMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Param>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}
