//! Run configuration — read once from the batch log header, immutable after.
//!
//! Header form: `{"D":"3", "T":"50"}`. Both values are documented as
//! integer strings; bare JSON integers are accepted as well.

use crate::error::{AnomalyError, AnomalyResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Hop limit for neighborhood expansion (`D`). Zero or negative disables
    /// neighborhood-based detection.
    pub degrees: i64,
    /// Number of purchases kept per user (`T`). Always at least one.
    pub window:  usize,
}

#[derive(Debug, Deserialize)]
struct HeaderLine {
    #[serde(rename = "D")]
    degrees: Option<serde_json::Value>,
    #[serde(rename = "T")]
    window:  Option<serde_json::Value>,
}

impl NetworkConfig {
    pub fn new(degrees: i64, window: usize) -> AnomalyResult<Self> {
        if window == 0 {
            return Err(AnomalyError::MalformedHeader {
                reason: "T must be at least 1".to_string(),
            });
        }
        Ok(Self { degrees, window })
    }

    /// Parse the first line of a batch log.
    pub fn from_header_line(line: &str) -> AnomalyResult<Self> {
        let header: HeaderLine = serde_json::from_str(line.trim())
            .map_err(|e| AnomalyError::MalformedHeader { reason: e.to_string() })?;

        let degrees = integer_field("D", header.degrees.as_ref())?;
        let window = integer_field("T", header.window.as_ref())?;
        let window = usize::try_from(window).map_err(|_| AnomalyError::MalformedHeader {
            reason: format!("T must be a non-negative integer, got {window}"),
        })?;

        Self::new(degrees, window)
    }

    /// Header line as it appears at the top of a batch log.
    pub fn to_header_line(&self) -> String {
        format!(r#"{{"D":"{}", "T":"{}"}}"#, self.degrees, self.window)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self { degrees: 1, window: 2 }
    }
}

fn integer_field(name: &str, value: Option<&serde_json::Value>) -> AnomalyResult<i64> {
    let malformed = |reason: String| AnomalyError::MalformedHeader { reason };
    match value {
        None => Err(malformed(format!("missing {name}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(format!("{name} is not an integer: {s:?}"))),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| malformed(format!("{name} is not an integer: {n}"))),
        Some(other) => Err(malformed(format!("{name} is not an integer: {other}"))),
    }
}
