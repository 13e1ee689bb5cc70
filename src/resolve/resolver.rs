//! Path resolver.
//!
//! Walks a [`PathSpec`] against the schema graph one segment at a time. The
//! first segment that does not resolve ends the walk and comes back as an
//! [`Unresolved`] value; the caller records it and moves on to siblings.

use tracing::trace;

use crate::schema::SchemaGraph;

use super::{Hop, PathSpec, Resolution, ResolvedPath, Unresolved, UnresolvedKind};

/// Default bound on the bare-field association search.
pub const DEFAULT_MAX_SEARCH_DEPTH: usize = 4;

#[derive(Clone, Copy)]
pub struct PathResolver<'g> {
    graph: &'g dyn SchemaGraph,
    deep_search: bool,
    max_depth: usize,
}

impl<'g> PathResolver<'g> {
    pub fn new(graph: &'g dyn SchemaGraph) -> Self {
        Self {
            graph,
            deep_search: true,
            max_depth: DEFAULT_MAX_SEARCH_DEPTH,
        }
    }

    /// Enable or disable the association search for bare field names.
    pub fn with_deep_search(mut self, enabled: bool) -> Self {
        self.deep_search = enabled;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Resolve any spec shape from `root`.
    ///
    /// Direction tags are transparent; derived specs resolve their source.
    pub fn resolve(&self, spec: &PathSpec, root: &str) -> Resolution {
        match spec {
            PathSpec::Field(name) => self.resolve_field(name, root),
            PathSpec::Path(segments) => self.resolve_segments(segments, root, Vec::new()),
            PathSpec::Directional(_, inner) => self.resolve(inner, root),
            PathSpec::Derived(derived) => self.resolve(&derived.source, root),
        }
    }

    /// Resolve `segments` starting at `entity`, with `hops` already taken.
    ///
    /// A multi-segment path only ever looks at the fields of the entity its
    /// last association lands on.
    pub fn resolve_segments(
        &self,
        segments: &[String],
        entity: &str,
        mut hops: Vec<Hop>,
    ) -> Resolution {
        match segments {
            [] => Err(self.unresolved(UnresolvedKind::EmptyPath, "", entity, &hops)),
            [field] => {
                if self.graph.has_field(entity, field) {
                    trace!(entity, field = field.as_str(), "resolved field");
                    Ok(ResolvedPath {
                        field: field.clone(),
                        entity: entity.into(),
                        hops,
                    })
                } else {
                    Err(self.unresolved(UnresolvedKind::Field, field, entity, &hops))
                }
            }
            [association, rest @ ..] => match self.graph.association(entity, association) {
                Some(target) => {
                    hops.push(Hop {
                        association: association.clone(),
                        from_entity: entity.into(),
                        to_entity: target.entity.clone(),
                        cardinality: target.cardinality,
                    });
                    self.resolve_segments(rest, &target.entity, hops)
                }
                None => Err(self.unresolved(
                    UnresolvedKind::Association,
                    association,
                    entity,
                    &hops,
                )),
            },
        }
    }

    /// Resolve a bare field name.
    ///
    /// Falls back to a depth-first search across the root's associations
    /// (declaration order, first match wins) when the root lacks the field.
    pub fn resolve_field(&self, field: &str, root: &str) -> Resolution {
        if self.graph.has_field(root, field) {
            return Ok(ResolvedPath {
                field: field.into(),
                entity: root.into(),
                hops: vec![],
            });
        }

        if self.deep_search {
            let mut hops = Vec::new();
            let mut visiting = vec![root.to_string()];
            if let Some(found) = self.search(field, root, &mut hops, &mut visiting) {
                trace!(
                    field,
                    entity = found.entity.as_str(),
                    depth = found.hops.len(),
                    "bare field found through associations"
                );
                return Ok(found);
            }
        }

        Err(self.unresolved(UnresolvedKind::Field, field, root, &[]))
    }

    fn search(
        &self,
        field: &str,
        entity: &str,
        hops: &mut Vec<Hop>,
        visiting: &mut Vec<String>,
    ) -> Option<ResolvedPath> {
        if hops.len() >= self.max_depth {
            return None;
        }

        for association in self.graph.association_names(entity) {
            let Some(target) = self.graph.association(entity, association) else {
                continue;
            };
            // Entities already on the current search path would loop forever.
            if visiting.contains(&target.entity) {
                continue;
            }

            hops.push(Hop {
                association: association.into(),
                from_entity: entity.into(),
                to_entity: target.entity.clone(),
                cardinality: target.cardinality,
            });

            if self.graph.has_field(&target.entity, field) {
                return Some(ResolvedPath {
                    field: field.into(),
                    entity: target.entity,
                    hops: hops.clone(),
                });
            }

            visiting.push(target.entity.clone());
            if let Some(found) = self.search(field, &target.entity, hops, visiting) {
                return Some(found);
            }
            visiting.pop();
            hops.pop();
        }

        None
    }

    fn unresolved(
        &self,
        kind: UnresolvedKind,
        segment: &str,
        entity: &str,
        hops: &[Hop],
    ) -> Unresolved {
        Unresolved {
            kind,
            segment: segment.into(),
            consumed: hops.iter().map(|h| h.association.clone()).collect(),
            entity: entity.into(),
        }
    }
}
