//! Schema graph - the read-only entity/association model queries resolve against.
//!
//! The planner only ever talks to the [`SchemaGraph`] trait. [`Schema`] is the
//! in-memory implementation, built either fluently through [`SchemaBuilder`] or
//! declaratively from TOML/JSON (see [`loader`]).
//!
//! The module is organized into submodules:
//! - `builder`: Fluent entity and schema construction
//! - `loader`: Declarative schema definitions (serde)

mod builder;
pub mod loader;


use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

pub use builder::{EntityDef, SchemaBuilder};

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while constructing a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate entity: '{0}'")]
    DuplicateEntity(String),

    #[error("Duplicate member '{member}' on entity '{entity}'")]
    DuplicateMember { entity: String, member: String },

    #[error("Association '{association}' on '{entity}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        association: String,
        target: String,
    },

    #[error("Failed to parse schema definition: {0}")]
    Parse(String),
}

/// Cardinality of an association, seen from its owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one related record (belongs-to / has-one).
    One,
    /// Any number of related records (has-many).
    Many,
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
        }
    }
}

/// The far side of an association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationTarget {
    pub entity: String,
    pub cardinality: Cardinality,
}

/// Read-only access to entity and association metadata.
///
/// Implementations must be safe to query from many builds at once; nothing
/// in this crate mutates a schema graph.
pub trait SchemaGraph: Send + Sync {
    /// Does an entity type with this name exist?
    fn contains_entity(&self, entity: &str) -> bool;

    /// Field names of an entity, in declaration order. Empty for unknown entities.
    fn field_names(&self, entity: &str) -> Vec<&str>;

    /// Association names of an entity, in declaration order.
    fn association_names(&self, entity: &str) -> Vec<&str>;

    /// Look up an association's related entity type and cardinality.
    fn association(&self, entity: &str, association: &str) -> Option<AssociationTarget>;

    fn has_field(&self, entity: &str, field: &str) -> bool {
        self.field_names(entity).contains(&field)
    }
}

/// A node in the schema graph.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub name: String,
    pub fields: Vec<String>,
    /// Association names in declaration order. Edge iteration order in
    /// petgraph is not insertion order, so the order is kept here.
    pub associations: Vec<String>,
}

/// Edge data for an association.
#[derive(Debug, Clone)]
pub struct AssociationEdge {
    pub name: String,
    pub cardinality: Cardinality,
}

/// In-memory schema graph.
///
/// Entities are nodes, associations are directed edges from the owning
/// entity to the related one.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) graph: DiGraph<EntityNode, AssociationEdge>,
    pub(crate) node_indices: HashMap<String, NodeIndex>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Number of entity types.
    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of associations across all entities.
    pub fn association_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.node_indices.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn node(&self, entity: &str) -> Option<&EntityNode> {
        self.node_indices.get(entity).map(|idx| &self.graph[*idx])
    }
}

impl SchemaGraph for Schema {
    fn contains_entity(&self, entity: &str) -> bool {
        self.node_indices.contains_key(entity)
    }

    fn field_names(&self, entity: &str) -> Vec<&str> {
        self.node(entity)
            .map(|node| node.fields.iter().map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }

    fn association_names(&self, entity: &str) -> Vec<&str> {
        self.node(entity)
            .map(|node| node.associations.iter().map(|a| a.as_str()).collect())
            .unwrap_or_default()
    }

    fn association(&self, entity: &str, association: &str) -> Option<AssociationTarget> {
        let idx = self.node_indices.get(entity)?;
        self.graph
            .edges(*idx)
            .find(|edge| edge.weight().name == association)
            .map(|edge| AssociationTarget {
                entity: self.graph[edge.target()].name.clone(),
                cardinality: edge.weight().cardinality,
            })
    }

    fn has_field(&self, entity: &str, field: &str) -> bool {
        self.node(entity)
            .is_some_and(|node| node.fields.iter().any(|f| f == field))
    }
}
