//! Aggregator - aggregate projection entries over an optional grouping.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{BuildError, BuildResult, ErrorKind};
use crate::query::expr;
use crate::query::Expr;
use crate::resolve::PathSpec;

use super::QueryBuilder;

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    /// Parse an aggregate symbol.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "count" => Some(AggregateFn::Count),
            "sum" => Some(AggregateFn::Sum),
            "avg" | "average" => Some(AggregateFn::Avg),
            "min" | "minimum" => Some(AggregateFn::Min),
            "max" | "maximum" => Some(AggregateFn::Max),
            _ => None,
        }
    }

    /// Canonical symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
        }
    }

    pub fn apply(&self, arg: Expr) -> Expr {
        match self {
            AggregateFn::Count => expr::count(arg),
            AggregateFn::Sum => expr::sum(arg),
            AggregateFn::Avg => expr::avg(arg),
            AggregateFn::Min => expr::min(arg),
            AggregateFn::Max => expr::max(arg),
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `(function, path)` pair of an aggregate request.
///
/// The symbol is kept as written so the entry is named the way the caller
/// spelled it; `alias` overrides that name.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub function: String,
    pub path: PathSpec,
    pub alias: Option<String>,
}

impl AggregateSpec {
    pub fn new(function: impl Into<String>, path: impl Into<PathSpec>) -> Self {
        Self {
            function: function.into(),
            path: path.into(),
            alias: None,
        }
    }

    pub fn of(function: AggregateFn, path: impl Into<PathSpec>) -> Self {
        Self::new(function.symbol(), path)
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Output name of the projection entry.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.function)
    }
}

impl<'g> QueryBuilder<'g> {
    /// Group by `group_by` (when non-empty), then add one projection entry
    /// per aggregate pair.
    ///
    /// Fails when a pair names a symbol outside the supported set.
    pub fn aggregate(
        mut self,
        group_by: &[PathSpec],
        aggregates: &[AggregateSpec],
    ) -> BuildResult<Self> {
        if !group_by.is_empty() {
            self = self.group_by(group_by);
        }
        for spec in aggregates {
            self.aggregate_spec(spec)?;
        }
        Ok(self)
    }

    fn aggregate_spec(&mut self, spec: &AggregateSpec) -> BuildResult<()> {
        let function = AggregateFn::from_symbol(&spec.function).ok_or_else(|| {
            BuildError::UnsupportedAggregate {
                symbol: spec.function.clone(),
            }
        })?;
        let name = spec.name();

        if spec.path.is_derived() {
            let path = spec.path.segments().into_iter().map(String::from).collect();
            self.record(
                ErrorKind::Aggregate,
                path,
                format!("aggregate '{}' cannot take a derived expression as source", name),
            );
            return Ok(());
        }

        if self.strict_aggregate_aliases && self.acc.query.projection(name).is_some() {
            let path = spec.path.segments().into_iter().map(String::from).collect();
            self.record(
                ErrorKind::Aggregate,
                path,
                format!("projection entry '{}' already exists", name),
            );
            return Ok(());
        }

        let resolved = match self.resolver.resolve(&spec.path, self.root()) {
            Ok(resolved) => resolved,
            Err(unresolved) => {
                self.record(ErrorKind::Aggregate, unresolved.path(), unresolved.message());
                return Ok(());
            }
        };

        let arg = self.bind(&resolved);
        let expr = function.apply(arg);
        debug!(name, function = function.symbol(), "projected aggregate");
        if let Some(replaced) = self.acc.query.project(name, expr) {
            warn!(name, replaced = %replaced, "aggregate entry overwrote an existing projection");
        }
        Ok(())
    }
}
