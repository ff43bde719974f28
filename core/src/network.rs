//! The consumer network — owner of the social graph and purchase histories.
//!
//! PER-EVENT PROTOCOL (fixed order):
//!   1. Admit every user the event references (graph node + empty history).
//!   2. Dispatch on the event kind:
//!        purchase  -> optional anomaly test, then record into own history
//!        befriend  -> add edge
//!        unfriend  -> remove edge (EdgeNotFound if absent)
//!
//! RULES:
//!   - Graph and history are mutated only through `apply`.
//!   - The anomaly test sees the neighborhood as it is before the purchase
//!     is recorded, and runs once against the full aggregated sample.
//!   - The purchase is recorded whether or not it was tested or flagged.

use crate::{
    config::NetworkConfig,
    detector::AnomalyDetector,
    error::{AnomalyError, AnomalyResult},
    event::{FlaggedPurchase, NetworkEvent, PurchaseAmount},
    graph::SocialGraph,
    history::PurchaseHistory,
    neighborhood,
    types::{Amount, UserId},
};
use std::collections::BTreeSet;

/// Whether purchases are tested before they are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build initial state from the historical log; nothing is flagged.
    Batch,
    /// Test every purchase against its network and flag outliers.
    Stream,
}

impl Mode {
    pub fn checks_anomalies(&self) -> bool {
        matches!(self, Self::Stream)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Batch  => "batch",
            Self::Stream => "stream",
        }
    }
}

pub struct ConsumerNetwork {
    config:   NetworkConfig,
    graph:    SocialGraph,
    history:  PurchaseHistory,
    detector: AnomalyDetector,
}

impl ConsumerNetwork {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            graph:    SocialGraph::new(),
            history:  PurchaseHistory::new(config.window),
            detector: AnomalyDetector::new(),
            config,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    pub fn history(&self) -> &PurchaseHistory {
        &self.history
    }

    /// Apply one event. Returns the flagged record when a stream-mode
    /// purchase is anomalous.
    pub fn apply(
        &mut self,
        event: &NetworkEvent,
        mode: Mode,
    ) -> AnomalyResult<Option<FlaggedPurchase>> {
        // A failed unfriend must leave the network exactly as it was.
        if let NetworkEvent::Unfriend { id1, id2, .. } = event {
            if !self.graph.has_edge(id1, id2) {
                return Err(AnomalyError::EdgeNotFound {
                    id1: id1.clone(),
                    id2: id2.clone(),
                });
            }
        }

        for id in event.users() {
            self.admit(id);
        }

        match event {
            NetworkEvent::Purchase { timestamp, id, amount } => {
                let flag = if mode.checks_anomalies() {
                    self.check_purchase(timestamp, id, amount)
                } else {
                    None
                };
                self.history.record(id, amount.value);
                Ok(flag)
            }
            NetworkEvent::Befriend { id1, id2, .. } => {
                self.graph.add_edge(id1, id2);
                Ok(None)
            }
            NetworkEvent::Unfriend { id1, id2, .. } => {
                self.graph.remove_edge(id1, id2)?;
                Ok(None)
            }
        }
    }

    /// Users within `degrees` hops of `id`, as of now.
    pub fn neighborhood(&self, id: &str) -> BTreeSet<UserId> {
        neighborhood::expand(&self.graph, id, self.config.degrees)
    }

    /// Every neighbor's full purchase window, concatenated.
    pub fn network_purchases(&self, id: &str) -> Vec<Amount> {
        let mut sample = Vec::new();
        for neighbor in self.neighborhood(id) {
            self.history.extend_sample(&neighbor, &mut sample);
        }
        sample
    }

    fn admit(&mut self, id: &str) {
        self.history.ensure_user(id);
        self.graph.add_node(id);
    }

    fn check_purchase(
        &self,
        timestamp: &str,
        id: &str,
        amount: &PurchaseAmount,
    ) -> Option<FlaggedPurchase> {
        let sample = self.network_purchases(id);
        let stats = self.detector.evaluate(amount.value, &sample)?;
        log::debug!(
            "Flagged purchase by {id}: {} > {:.2} + 3 * {:.2} over {} network purchases",
            amount.text,
            stats.mean,
            stats.sd,
            sample.len()
        );
        Some(FlaggedPurchase::new(timestamp, id, amount, &stats))
    }
}
