//! Undirected social graph of users.
//!
//! Adjacency is kept in ordered sets so neighbor iteration, and anything
//! aggregated from it, is deterministic for a given event log.

use crate::{
    error::{AnomalyError, AnomalyResult},
    types::UserId,
};
use std::collections::{BTreeSet, HashMap};

static NO_NEIGHBORS: BTreeSet<UserId> = BTreeSet::new();

#[derive(Debug, Default, Clone)]
pub struct SocialGraph {
    adjacency: HashMap<UserId, BTreeSet<UserId>>,
}

impl SocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn add_node(&mut self, id: &str) {
        if !self.adjacency.contains_key(id) {
            self.adjacency.insert(id.to_string(), BTreeSet::new());
        }
    }

    /// Idempotent; creates missing endpoints.
    pub fn add_edge(&mut self, id1: &str, id2: &str) {
        self.add_node(id1);
        self.add_node(id2);
        if let Some(set) = self.adjacency.get_mut(id1) {
            set.insert(id2.to_string());
        }
        if let Some(set) = self.adjacency.get_mut(id2) {
            set.insert(id1.to_string());
        }
    }

    /// Fails with `EdgeNotFound` and leaves the graph untouched when the
    /// pair is not connected.
    pub fn remove_edge(&mut self, id1: &str, id2: &str) -> AnomalyResult<()> {
        if !self.has_edge(id1, id2) {
            return Err(AnomalyError::EdgeNotFound {
                id1: id1.to_string(),
                id2: id2.to_string(),
            });
        }
        if let Some(set) = self.adjacency.get_mut(id1) {
            set.remove(id2);
        }
        if let Some(set) = self.adjacency.get_mut(id2) {
            set.remove(id1);
        }
        Ok(())
    }

    /// Direct neighbors of `id`; empty for unknown users.
    pub fn neighbors(&self, id: &str) -> &BTreeSet<UserId> {
        self.adjacency.get(id).unwrap_or(&NO_NEIGHBORS)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn has_edge(&self, id1: &str, id2: &str) -> bool {
        self.adjacency
            .get(id1)
            .is_some_and(|set| set.contains(id2))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency
            .iter()
            .map(|(id, set)| set.iter().filter(|other| id <= *other).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn befriend_twice_yields_one_edge() {
        let mut g = SocialGraph::new();
        g.add_edge("a", "b");
        g.add_edge("b", "a");
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node_count(), 2);
        assert!(g.has_edge("a", "b") && g.has_edge("b", "a"));
    }

    #[test]
    fn removing_missing_edge_fails_without_mutation() {
        let mut g = SocialGraph::new();
        g.add_edge("a", "b");
        g.add_node("c");

        let err = g.remove_edge("a", "c").unwrap_err();
        assert!(matches!(err, AnomalyError::EdgeNotFound { .. }));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node_count(), 3);

        g.remove_edge("b", "a").unwrap();
        assert_eq!(g.edge_count(), 0);
        assert!(matches!(
            g.remove_edge("a", "b"),
            Err(AnomalyError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn neighbors_of_unknown_user_is_empty() {
        let g = SocialGraph::new();
        assert!(g.neighbors("ghost").is_empty());
    }

    #[test]
    fn multi_character_keys_are_distinct() {
        let mut g = SocialGraph::new();
        g.add_edge("10", "1");
        g.add_edge("10", "0");
        let n: Vec<&str> = g.neighbors("10").iter().map(String::as_str).collect();
        assert_eq!(n, vec!["0", "1"]);
    }
}
