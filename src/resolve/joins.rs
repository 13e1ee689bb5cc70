//! Join registry - exactly one join per distinct binding chain.
//!
//! A registry lives for one build. Every accumulator in that build goes
//! through it, so `select [[author, publisher, name]]` followed by
//! `sort [[author, name]]` reuses the `author` join instead of adding a
//! second one.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::query::{BindingChain, Join, JoinType, Query};

use super::Hop;

/// Default separator between alias segments.
pub const DEFAULT_ALIAS_SEPARATOR: &str = "__";

#[derive(Debug, Clone)]
pub struct JoinRegistry {
    root_alias: String,
    separator: String,
    aliases: HashMap<BindingChain, String>,
    taken: HashSet<String>,
}

impl JoinRegistry {
    pub fn new(root_alias: &str) -> Self {
        Self::with_separator(root_alias, DEFAULT_ALIAS_SEPARATOR)
    }

    pub fn with_separator(root_alias: &str, separator: &str) -> Self {
        let mut taken = HashSet::new();
        taken.insert(root_alias.to_string());
        Self {
            root_alias: root_alias.into(),
            separator: separator.into(),
            aliases: HashMap::new(),
            taken,
        }
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    /// Alias for an already registered chain. The root chain maps to the root alias.
    pub fn alias_for(&self, chain: &BindingChain) -> Option<&str> {
        if chain.is_root() {
            return Some(&self.root_alias);
        }
        self.aliases.get(chain).map(|s| s.as_str())
    }

    /// Number of registered joins.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Ensure a join exists for every prefix of `hops` and return the alias
    /// of the full chain.
    ///
    /// Known prefixes are reused; only the missing suffix is appended to
    /// `query.joins`. Registering a known chain changes nothing.
    pub fn register(&mut self, query: &mut Query, hops: &[Hop]) -> String {
        let mut chain = BindingChain::root();
        let mut parent_alias = self.root_alias.clone();

        for hop in hops {
            chain = chain.child(&hop.association);

            if let Some(existing) = self.aliases.get(&chain) {
                parent_alias = existing.clone();
                continue;
            }

            let alias = self.fresh_alias(&parent_alias, &hop.association);
            debug!(
                chain = %chain,
                alias = alias.as_str(),
                entity = hop.to_entity.as_str(),
                "registered join"
            );

            query.joins.push(Join {
                join_type: JoinType::Left,
                chain: chain.clone(),
                parent_alias,
                association: hop.association.clone(),
                entity: hop.to_entity.clone(),
                alias: alias.clone(),
                cardinality: hop.cardinality,
            });
            self.aliases.insert(chain.clone(), alias.clone());
            parent_alias = alias;
        }

        parent_alias
    }

    /// `parent + separator + association`, suffixed with `_2`, `_3`, ... when
    /// an association name containing the separator would reproduce an alias
    /// another chain already owns.
    fn fresh_alias(&mut self, parent: &str, association: &str) -> String {
        let base = format!("{}{}{}", parent, self.separator, association);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
