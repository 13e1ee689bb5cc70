//! Grouper - GROUP BY terms.

use tracing::debug;

use crate::error::ErrorKind;
use crate::query::expr::alias;
use crate::query::Expr;
use crate::resolve::{PathSpec, UnresolvedKind};

use super::QueryBuilder;

impl<'g> QueryBuilder<'g> {
    /// Add group-by terms, one per distinct key, in input order.
    ///
    /// A key whose terminal field does not resolve is taken to name an
    /// output alias and is grouped as such. A bad association segment is
    /// recorded as a `group` error.
    pub fn group_by(mut self, specs: &[PathSpec]) -> Self {
        let mut seen: Vec<&PathSpec> = Vec::with_capacity(specs.len());
        for spec in specs {
            if seen.contains(&spec) {
                continue;
            }
            seen.push(spec);
            self.group_spec(spec);
        }
        self
    }

    fn group_spec(&mut self, spec: &PathSpec) {
        match spec {
            PathSpec::Derived(derived) => {
                let path = derived.source.segments().into_iter().map(String::from).collect();
                self.record(
                    ErrorKind::Group,
                    path,
                    "derived expressions cannot be grouped; group by their alias instead",
                );
            }
            PathSpec::Directional(_, inner) => self.group_spec(inner),
            PathSpec::Field(_) | PathSpec::Path(_) => {
                if let Some(expr) = self.term(ErrorKind::Group, spec) {
                    self.acc.query.group_by.push(expr);
                }
            }
        }
    }

    /// Resolve a grouping or sorting term.
    ///
    /// An unknown terminal field falls back to an alias reference. Any
    /// other failure is recorded under `kind` and yields nothing.
    pub(super) fn term(&mut self, kind: ErrorKind, spec: &PathSpec) -> Option<Expr> {
        match self.resolver.resolve(spec, self.root()) {
            Ok(resolved) => Some(self.bind(&resolved)),
            Err(unresolved) if unresolved.kind == UnresolvedKind::Field => {
                debug!(
                    kind = kind.as_str(),
                    name = unresolved.segment.as_str(),
                    "unresolved field treated as output alias"
                );
                Some(alias(&unresolved.segment))
            }
            Err(unresolved) => {
                self.record(kind, unresolved.path(), unresolved.message());
                None
            }
        }
    }
}
