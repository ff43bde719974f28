//! Degree-limited neighborhood expansion.

use crate::{graph::SocialGraph, types::UserId};
use std::collections::BTreeSet;

/// Users within 1..=`degrees` hops of `id`, never including `id` itself.
///
/// Breadth-first: each round adds the neighbors of the users discovered in
/// the previous round. Computed against the graph as it is right now.
pub fn expand(graph: &SocialGraph, id: &str, degrees: i64) -> BTreeSet<UserId> {
    if degrees <= 0 {
        return BTreeSet::new();
    }

    let mut reached: BTreeSet<UserId> = graph.neighbors(id).clone();
    let mut frontier: Vec<UserId> = reached.iter().cloned().collect();

    for _ in 1..degrees {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for user in &frontier {
            for neighbor in graph.neighbors(user) {
                if reached.insert(neighbor.clone()) {
                    next.push(neighbor.clone());
                }
            }
        }
        frontier = next;
    }

    reached.remove(id);
    reached
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ids: &[&str]) -> SocialGraph {
        let mut g = SocialGraph::new();
        for pair in ids.windows(2) {
            g.add_edge(pair[0], pair[1]);
        }
        g
    }

    fn names(set: &BTreeSet<UserId>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn zero_or_negative_degrees_is_empty() {
        let g = chain(&["a", "b", "c"]);
        assert!(expand(&g, "a", 0).is_empty());
        assert!(expand(&g, "a", -3).is_empty());
    }

    #[test]
    fn respects_hop_limit() {
        let g = chain(&["a", "b", "c", "d", "e"]);
        assert_eq!(names(&expand(&g, "a", 1)), vec!["b"]);
        assert_eq!(names(&expand(&g, "a", 2)), vec!["b", "c"]);
        assert_eq!(names(&expand(&g, "c", 2)), vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn excludes_source_through_cycles() {
        let g = chain(&["a", "b", "c", "a"]);
        let n = expand(&g, "a", 5);
        assert!(!n.contains("a"));
        assert_eq!(names(&n), vec!["b", "c"]);
    }

    #[test]
    fn excludes_only_the_source_key() {
        // "12" must not knock out "1" or "2".
        let g = chain(&["12", "1", "2"]);
        assert_eq!(names(&expand(&g, "12", 2)), vec!["1", "2"]);
    }

    #[test]
    fn isolated_user_has_no_neighborhood() {
        let mut g = SocialGraph::new();
        g.add_node("solo");
        assert!(expand(&g, "solo", 3).is_empty());
        assert!(expand(&g, "unknown", 3).is_empty());
    }
}
