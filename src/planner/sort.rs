//! Sorter - direction-tagged ORDER BY terms.

use crate::error::ErrorKind;
use crate::query::{OrderByExpr, SortDir};
use crate::resolve::PathSpec;

use super::QueryBuilder;

impl<'g> QueryBuilder<'g> {
    /// Append order-by terms in input order.
    ///
    /// Untagged entries sort ascending. Unknown terminal fields fall back to
    /// output alias references, as in grouping.
    pub fn order_by(mut self, specs: &[PathSpec]) -> Self {
        for spec in specs {
            self.sort_spec(spec, SortDir::default());
        }
        self
    }

    fn sort_spec(&mut self, spec: &PathSpec, dir: SortDir) {
        match spec {
            // Innermost tag wins.
            PathSpec::Directional(inner_dir, inner) => self.sort_spec(inner, *inner_dir),
            PathSpec::Derived(derived) => {
                let path = derived.source.segments().into_iter().map(String::from).collect();
                self.record(
                    ErrorKind::Sort,
                    path,
                    "derived expressions cannot be sorted; sort by their alias instead",
                );
            }
            PathSpec::Field(_) | PathSpec::Path(_) => {
                if let Some(expr) = self.term(ErrorKind::Sort, spec) {
                    self.acc.query.order_by.push(OrderByExpr { expr, dir });
                }
            }
        }
    }
}
