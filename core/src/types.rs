//! Shared primitive types used across the entire network.

/// A stable, unique identifier for a user in the social network.
pub type UserId = String;

/// A purchase amount in currency units.
pub type Amount = f64;

/// The canonical run identifier.
pub type RunId = String;

/// Event timestamp format used by the batch and stream logs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
