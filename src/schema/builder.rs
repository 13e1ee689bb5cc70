//! Fluent schema construction.

use std::collections::{HashMap, HashSet};

use petgraph::graph::DiGraph;

use super::{AssociationEdge, Cardinality, EntityNode, Schema, SchemaError, SchemaResult};

/// Declaration of one entity type.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct EntityDef {
    pub name: String,
    pub fields: Vec<String>,
    pub associations: Vec<(String, String, Cardinality)>,
}

impl EntityDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
            associations: vec![],
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn with_fields<'a>(mut self, fields: impl IntoIterator<Item = &'a str>) -> Self {
        self.fields.extend(fields.into_iter().map(String::from));
        self
    }

    /// Declare a to-one association (`belongs_to` / `has_one`).
    pub fn belongs_to(self, name: &str, entity: &str) -> Self {
        self.with_association(name, entity, Cardinality::One)
    }

    /// Declare a to-many association.
    pub fn has_many(self, name: &str, entity: &str) -> Self {
        self.with_association(name, entity, Cardinality::Many)
    }

    pub fn with_association(mut self, name: &str, entity: &str, cardinality: Cardinality) -> Self {
        self.associations
            .push((name.into(), entity.into(), cardinality));
        self
    }
}

/// Collects entity declarations and validates them into a [`Schema`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until built"]
pub struct SchemaBuilder {
    entities: Vec<EntityDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validate the declarations and build the graph.
    ///
    /// Fails on duplicate entities, a field and association sharing a name
    /// (or either declared twice), and associations targeting an entity that
    /// was never declared.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for def in &self.entities {
            if node_indices.contains_key(&def.name) {
                return Err(SchemaError::DuplicateEntity(def.name.clone()));
            }

            let mut members = HashSet::new();
            let names = def
                .fields
                .iter()
                .chain(def.associations.iter().map(|(name, _, _)| name));
            for name in names {
                if !members.insert(name.as_str()) {
                    return Err(SchemaError::DuplicateMember {
                        entity: def.name.clone(),
                        member: name.clone(),
                    });
                }
            }

            let idx = graph.add_node(EntityNode {
                name: def.name.clone(),
                fields: def.fields.clone(),
                associations: def
                    .associations
                    .iter()
                    .map(|(name, _, _)| name.clone())
                    .collect(),
            });
            node_indices.insert(def.name.clone(), idx);
        }

        for def in &self.entities {
            let from_idx = node_indices[&def.name];
            for (name, target, cardinality) in &def.associations {
                let to_idx =
                    node_indices
                        .get(target)
                        .ok_or_else(|| SchemaError::UnknownTarget {
                            entity: def.name.clone(),
                            association: name.clone(),
                            target: target.clone(),
                        })?;

                graph.add_edge(
                    from_idx,
                    *to_idx,
                    AssociationEdge {
                        name: name.clone(),
                        cardinality: *cardinality,
                    },
                );
            }
        }

        Ok(Schema {
            graph,
            node_indices,
        })
    }
}
