//! Path resolution and join bookkeeping.
//!
//! - `path`: the [`PathSpec`] sum type callers build requests from
//! - `resolver`: walks a spec against the schema graph
//! - `joins`: one join per distinct binding chain, per build

pub mod joins;
pub mod path;
pub mod resolver;

use crate::schema::Cardinality;

pub use joins::JoinRegistry;
pub use path::{DerivedSpec, FunctionRef, Param, PathSpec};
pub use resolver::PathResolver;

/// One association step taken while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub association: String,
    pub from_entity: String,
    pub to_entity: String,
    pub cardinality: Cardinality,
}

/// A successfully resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub field: String,
    /// Entity type that declares `field`.
    pub entity: String,
    pub hops: Vec<Hop>,
}

impl ResolvedPath {
    /// Names from the root to the field, inclusive.
    pub fn path(&self) -> Vec<String> {
        self.hops
            .iter()
            .map(|h| h.association.clone())
            .chain(std::iter::once(self.field.clone()))
            .collect()
    }
}

/// Why resolution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedKind {
    /// A non-terminal segment is not an association of the current entity.
    Association,
    /// The terminal segment is not a field of the current entity.
    Field,
    /// Nothing to resolve.
    EmptyPath,
}

/// Resolution failure, returned as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub kind: UnresolvedKind,
    pub segment: String,
    /// Associations successfully walked before `segment`.
    pub consumed: Vec<String>,
    /// Entity the failing segment was looked up on.
    pub entity: String,
}

impl Unresolved {
    /// Root-to-failure path: the consumed chain plus the failing segment.
    pub fn path(&self) -> Vec<String> {
        let mut path = self.consumed.clone();
        if self.kind != UnresolvedKind::EmptyPath {
            path.push(self.segment.clone());
        }
        path
    }

    pub fn message(&self) -> String {
        match self.kind {
            UnresolvedKind::Association => {
                format!("unknown association '{}' on '{}'", self.segment, self.entity)
            }
            UnresolvedKind::Field => {
                format!("unknown field '{}' on '{}'", self.segment, self.entity)
            }
            UnresolvedKind::EmptyPath => "empty path".to_string(),
        }
    }
}

/// Outcome of resolving one path.
pub type Resolution = Result<ResolvedPath, Unresolved>;
