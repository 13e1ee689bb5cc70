//! Selector - named projection entries.

use tracing::debug;

use crate::error::{BuildError, BuildResult, ErrorKind};
use crate::resolve::{DerivedSpec, FunctionRef, PathSpec};

use super::functions::Function;
use super::QueryBuilder;

impl<'g> QueryBuilder<'g> {
    /// Add projection entries.
    ///
    /// Plain paths are projected under their field name; selecting the same
    /// name again replaces the earlier entry in place. Derived specs are
    /// projected under their alias. Entries from repeated calls accumulate.
    ///
    /// Fails only when a derived spec names a function the library does not
    /// know; the build is dropped in that case.
    pub fn select(mut self, specs: &[PathSpec]) -> BuildResult<Self> {
        for spec in specs {
            self.select_spec(spec)?;
        }
        Ok(self)
    }

    fn select_spec(&mut self, spec: &PathSpec) -> BuildResult<()> {
        match spec {
            PathSpec::Derived(derived) => self.select_derived(derived),
            // Direction has no meaning in a projection.
            PathSpec::Directional(_, inner) => self.select_spec(inner),
            PathSpec::Field(_) | PathSpec::Path(_) => {
                match self.resolver.resolve(spec, self.root()) {
                    Ok(resolved) => {
                        let expr = self.bind(&resolved);
                        self.acc.query.project(&resolved.field, expr);
                    }
                    Err(unresolved) => {
                        self.record(ErrorKind::Select, unresolved.path(), unresolved.message())
                    }
                }
                Ok(())
            }
        }
    }

    fn select_derived(&mut self, derived: &DerivedSpec) -> BuildResult<()> {
        let source = derived.source.to_string();

        // Unknown capability beats every per-entry problem.
        let function = Function::lookup(&derived.function).ok_or_else(|| match &derived.function {
            FunctionRef::Named(name) => BuildError::UnsupportedFunction {
                identifier: name.clone(),
                field: source.clone(),
            },
            FunctionRef::Fragment(fragment) => BuildError::UnsupportedFragment {
                fragment: fragment.clone(),
                field: source.clone(),
            },
        })?;

        let path: Vec<String> = derived.source.segments().into_iter().map(String::from).collect();

        let Some(alias) = derived.alias.as_deref() else {
            self.record(
                ErrorKind::Select,
                path,
                format!(
                    "derived expression '{}' over '{}' requires an output alias",
                    function.name(),
                    source
                ),
            );
            return Ok(());
        };

        if derived.source.is_derived() {
            self.record(
                ErrorKind::Select,
                path,
                "derived expressions cannot take another derived expression as source",
            );
            return Ok(());
        }

        if let Err(err) = function.validate(&derived.params) {
            self.record(ErrorKind::Select, path, err.to_string());
            return Ok(());
        }

        let resolved = match self.resolver.resolve(&derived.source, self.root()) {
            Ok(resolved) => resolved,
            Err(unresolved) => {
                self.record(ErrorKind::Select, unresolved.path(), unresolved.message());
                return Ok(());
            }
        };

        let arg = self.bind(&resolved);
        match function.apply(arg, &derived.params) {
            Ok(expr) => {
                debug!(alias, function = function.name(), "projected derived expression");
                self.acc.query.project(alias, expr);
            }
            Err(err) => self.record(ErrorKind::Select, resolved.path(), err.to_string()),
        }
        Ok(())
    }
}
