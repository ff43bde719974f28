//! Bounded per-user purchase history.
//!
//! RULE: A user's window never holds more than `window` amounts.
//! The oldest amount is evicted before the newest is appended.
//! Windows grow with use; `window` is a cap, never an allocation size.

use crate::types::{Amount, UserId};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct PurchaseHistory {
    window:  usize,
    by_user: HashMap<UserId, VecDeque<Amount>>,
}

impl PurchaseHistory {
    pub fn new(window: usize) -> Self {
        Self { window, by_user: HashMap::new() }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Create an empty entry for `id` if it has none.
    pub fn ensure_user(&mut self, id: &str) {
        if !self.by_user.contains_key(id) {
            self.by_user.insert(id.to_string(), VecDeque::new());
        }
    }

    pub fn record(&mut self, id: &str, amount: Amount) {
        self.ensure_user(id);
        let Some(entries) = self.by_user.get_mut(id) else {
            return;
        };
        if self.window == 0 {
            return;
        }
        if entries.len() >= self.window {
            entries.pop_front();
        }
        entries.push_back(amount);
    }

    /// Oldest first. Empty for unseen users.
    pub fn get(&self, id: &str) -> Vec<Amount> {
        self.by_user
            .get(id)
            .map(|entries| entries.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Append `id`'s window onto `sample` without an intermediate copy.
    pub fn extend_sample(&self, id: &str, sample: &mut Vec<Amount>) {
        if let Some(entries) = self.by_user.get(id) {
            sample.extend(entries.iter().copied());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_user.contains_key(id)
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_window_amounts_in_order() {
        let mut h = PurchaseHistory::new(3);
        for amount in [1.0, 2.0, 3.0, 4.0, 5.0] {
            h.record("u", amount);
        }
        assert_eq!(h.get("u"), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn short_sequence_is_kept_whole() {
        let mut h = PurchaseHistory::new(10);
        h.record("u", 7.5);
        h.record("u", 8.5);
        assert_eq!(h.get("u"), vec![7.5, 8.5]);
        assert!(h.get("nobody").is_empty());
    }

    #[test]
    fn zero_window_keeps_nothing() {
        let mut h = PurchaseHistory::new(0);
        h.record("u", 1.0);
        h.record("u", 2.0);
        assert!(h.contains("u"));
        assert!(h.get("u").is_empty());
    }

    #[test]
    fn huge_window_is_not_preallocated() {
        let mut h = PurchaseHistory::new(100_000_000_000);
        h.ensure_user("a");
        h.record("b", 3.0);
        assert!(h.get("a").is_empty());
        assert_eq!(h.get("b"), vec![3.0]);
    }

    #[test]
    fn ensure_user_creates_empty_window() {
        let mut h = PurchaseHistory::new(2);
        h.ensure_user("u");
        assert!(h.contains("u"));
        assert!(h.get("u").is_empty());
        assert_eq!(h.user_count(), 1);
    }
}
