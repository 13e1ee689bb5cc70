//! Query structure - the joinable, clause-accumulating output of a build.
//!
//! A [`Query`] is owned by exactly one build. It records the root entity,
//! every join the build needed (one per distinct [`BindingChain`]), a named
//! projection, and ordered GROUP BY / ORDER BY terms. Executing it against a
//! storage engine is someone else's job.

pub mod expr;

use std::fmt;

use crate::schema::Cardinality;

pub use expr::{Expr, Literal};

// =============================================================================
// Binding chain
// =============================================================================

/// Ordered association names from the root entity to a resolution point.
///
/// The empty chain is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingChain(Vec<String>);

impl BindingChain {
    pub fn root() -> Self {
        Self(vec![])
    }

    pub fn new<S: Into<String>>(associations: impl IntoIterator<Item = S>) -> Self {
        Self(associations.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A new chain with one more association appended.
    pub fn child(&self, association: &str) -> Self {
        let mut next = self.0.clone();
        next.push(association.into());
        Self(next)
    }
}

impl fmt::Display for BindingChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

// =============================================================================
// Select Expression (named projection entry)
// =============================================================================

/// A named projection entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub name: String,
    pub expr: Expr,
}

impl SelectExpr {
    pub fn new(name: &str, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
///
/// Every join is a left join, so a missing optional related record never
/// removes the owning row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Left,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Left => "left",
        }
    }
}

/// A join through one association.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    /// Full chain from the root, ending with `association`.
    pub chain: BindingChain,
    /// Alias of the join (or root) this one hangs off.
    pub parent_alias: String,
    pub association: String,
    /// Related entity type.
    pub entity: String,
    pub alias: String,
    pub cardinality: Cardinality,
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "asc"),
            SortDir::Desc => write!(f, "desc"),
        }
    }
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }
}

// =============================================================================
// LIMIT / OFFSET
// =============================================================================

/// LIMIT and OFFSET clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

// =============================================================================
// Query
// =============================================================================

/// The query structure produced by a build.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Root entity type.
    pub root: String,
    pub root_alias: String,
    /// Joins in creation order; at most one per binding chain.
    pub joins: Vec<Join>,
    /// Named projection in first-insertion order.
    pub select: Vec<SelectExpr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit_offset: Option<LimitOffset>,
}

impl Query {
    pub fn new(root: &str, root_alias: &str) -> Self {
        Self {
            root: root.into(),
            root_alias: root_alias.into(),
            joins: vec![],
            select: vec![],
            group_by: vec![],
            order_by: vec![],
            limit_offset: None,
        }
    }

    /// Add or replace a projection entry.
    ///
    /// An existing entry with the same name keeps its position and takes
    /// the new expression. Returns the expression that was replaced.
    pub fn project(&mut self, name: &str, expr: Expr) -> Option<Expr> {
        match self.select.iter_mut().find(|s| s.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.expr, expr)),
            None => {
                self.select.push(SelectExpr::new(name, expr));
                None
            }
        }
    }

    /// Look up a projection entry by output name.
    pub fn projection(&self, name: &str) -> Option<&Expr> {
        self.select.iter().find(|s| s.name == name).map(|s| &s.expr)
    }

    /// Output names in projection order.
    pub fn projection_names(&self) -> Vec<&str> {
        self.select.iter().map(|s| s.name.as_str()).collect()
    }

    /// The join registered for a chain.
    pub fn join_for(&self, chain: &BindingChain) -> Option<&Join> {
        self.joins.iter().find(|j| &j.chain == chain)
    }

    /// The join with a given alias.
    pub fn join_by_alias(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit_offset.get_or_insert_with(LimitOffset::default).limit = Some(limit);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.limit_offset.get_or_insert_with(LimitOffset::default).offset = Some(offset);
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit_offset.as_ref().and_then(|lo| lo.limit)
    }

    pub fn offset(&self) -> Option<u64> {
        self.limit_offset.as_ref().and_then(|lo| lo.offset)
    }

    /// Human-readable listing of the query structure, one clause per line.
    pub fn explain(&self) -> String {
        self.to_string().trim_end().to_string()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "from {} as {}", self.root, self.root_alias)?;
        for join in &self.joins {
            writeln!(
                f,
                "{} join {}.{} as {} ({}, {})",
                join.join_type.as_str(),
                join.parent_alias,
                join.association,
                join.alias,
                join.entity,
                join.cardinality
            )?;
        }
        for entry in &self.select {
            writeln!(f, "select {}: {}", entry.name, entry.expr)?;
        }
        for expr in &self.group_by {
            writeln!(f, "group by {}", expr)?;
        }
        for term in &self.order_by {
            writeln!(f, "order by {} {}", term.expr, term.dir)?;
        }
        if let Some(limit) = self.limit() {
            writeln!(f, "limit {}", limit)?;
        }
        if let Some(offset) = self.offset() {
            writeln!(f, "offset {}", offset)?;
        }
        Ok(())
    }
}
