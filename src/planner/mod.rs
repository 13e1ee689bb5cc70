//! Query planner - folds select/group/sort/aggregate requests into a [`Query`].
//!
//! A build threads one [`Accumulator`] (query + error list) through the
//! clause stages, in whatever order the caller invokes them:
//!
//! 1. **Select** - named projection entries, plain or derived (`select`)
//! 2. **Group** - GROUP BY terms (`group`)
//! 3. **Sort** - direction-tagged ORDER BY terms (`sort`)
//! 4. **Aggregate** - aggregate projection entries, optionally grouped (`aggregate`)
//!
//! Every stage resolves paths through the same [`PathResolver`] and
//! registers joins in the same [`JoinRegistry`], so a chain referenced by
//! several stages is joined once.
//!
//! Stages that can hit a fatal error consume the builder and return
//! [`BuildResult`]; on `Err` the partial build is gone.

mod aggregate;
pub mod functions;
mod group;
mod select;
mod sort;

use inflector::Inflector;
use tracing::debug;

use crate::config::Settings;
use crate::error::{BuildError, BuildResult, ErrorKind, ErrorRecord};
use crate::query::expr::column;
use crate::query::{Expr, Query};
use crate::resolve::{JoinRegistry, PathResolver, ResolvedPath};
use crate::schema::SchemaGraph;

pub use aggregate::{AggregateFn, AggregateSpec};
pub use functions::{Function, ParamError, TruncUnit};

/// The `(query, errors)` pair a build produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    pub query: Query,
    pub errors: Vec<ErrorRecord>,
}

impl Accumulator {
    /// True when every requested path was applied.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ErrorRecord> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// Builds one query against a schema graph.
///
/// ```ignore
/// let built = QueryBuilder::new(&schema, "Post")?
///     .select(&[PathSpec::field("title"), PathSpec::path(["author", "name"])])?
///     .order_by(&[PathSpec::field("inserted_at").desc()])
///     .limit(20)
///     .finish();
/// ```
pub struct QueryBuilder<'g> {
    resolver: PathResolver<'g>,
    registry: JoinRegistry,
    load_path: Vec<String>,
    strict_aggregate_aliases: bool,
    acc: Accumulator,
}

impl<'g> QueryBuilder<'g> {
    /// Start a build rooted at `root` with default settings.
    pub fn new(graph: &'g dyn SchemaGraph, root: &str) -> BuildResult<Self> {
        Self::with_settings(graph, root, &Settings::default())
    }

    pub fn with_settings(
        graph: &'g dyn SchemaGraph,
        root: &str,
        settings: &Settings,
    ) -> BuildResult<Self> {
        Self::configured(graph, root, None, settings)
    }

    /// Start a build with an explicit root alias instead of the snake_case
    /// entity name.
    pub fn configured(
        graph: &'g dyn SchemaGraph,
        root: &str,
        root_alias: Option<&str>,
        settings: &Settings,
    ) -> BuildResult<Self> {
        if !graph.contains_entity(root) {
            return Err(BuildError::UnknownEntity(root.into()));
        }

        let root_alias = root_alias
            .map(String::from)
            .unwrap_or_else(|| root.to_snake_case());

        debug!(root, root_alias = root_alias.as_str(), "starting build");

        Ok(Self {
            resolver: PathResolver::new(graph)
                .with_deep_search(settings.resolution.deep_search)
                .with_max_depth(settings.resolution.max_search_depth),
            registry: JoinRegistry::with_separator(&root_alias, &settings.aliases.separator),
            load_path: vec![],
            strict_aggregate_aliases: settings.aggregate.strict_aliases,
            acc: Accumulator {
                query: Query::new(root, &root_alias),
                errors: vec![],
            },
        })
    }

    /// Caller context copied into every error record, root first.
    pub fn load_path<S: Into<String>>(mut self, path: impl IntoIterator<Item = S>) -> Self {
        self.load_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.acc.query.set_limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.acc.query.set_offset(offset);
        self
    }

    pub fn query(&self) -> &Query {
        &self.acc.query
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.acc.errors
    }

    pub fn registry(&self) -> &JoinRegistry {
        &self.registry
    }

    /// End the build.
    pub fn finish(self) -> Accumulator {
        debug!(
            root = self.acc.query.root.as_str(),
            joins = self.acc.query.joins.len(),
            errors = self.acc.errors.len(),
            "finished build"
        );
        self.acc
    }

    fn root(&self) -> &str {
        &self.acc.query.root
    }

    /// Register the joins a resolved path needs and return its column.
    fn bind(&mut self, resolved: &ResolvedPath) -> Expr {
        let alias = self.registry.register(&mut self.acc.query, &resolved.hops);
        column(&alias, &resolved.field)
    }

    fn record(&mut self, kind: ErrorKind, path: Vec<String>, message: impl Into<String>) {
        let record = ErrorRecord::new(kind, path, self.load_path.clone(), message);
        debug!(error = %record, "recorded build error");
        self.acc.errors.push(record);
    }
}
