//! Network purchase anomaly detection.
//!
//! A purchase is anomalous when it sits more than three standard deviations
//! above the mean of the recent purchases made by the purchaser's social
//! network (friends within `D` hops, each contributing their last `T`
//! purchases). State is built from a batch log, then a stream log is
//! checked event by event.

pub mod config;
pub mod detector;
pub mod error;
pub mod event;
pub mod generator;
pub mod graph;
pub mod history;
pub mod neighborhood;
pub mod network;
pub mod processor;
pub mod rng;
pub mod sink;
pub mod store;
pub mod types;
