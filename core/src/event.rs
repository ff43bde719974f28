//! Event records — the input vocabulary of the network and its flagged output.
//!
//! RULE: The declared `event_type` selects which keys an event carries.
//! A purchase names one user (`id`); befriend/unfriend name two (`id1`, `id2`).
//! Unknown kinds are reported as `UnknownEventKind` and never reach the network.

use crate::{
    detector::SampleStats,
    error::{AnomalyError, AnomalyResult},
    types::{Amount, RunId, UserId},
};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Every event the network understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum NetworkEvent {
    Purchase {
        timestamp: String,
        #[serde(deserialize_with = "user_key")]
        id: UserId,
        #[serde(deserialize_with = "amount_value")]
        amount: PurchaseAmount,
    },
    Befriend {
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(deserialize_with = "user_key")]
        id1: UserId,
        #[serde(deserialize_with = "user_key")]
        id2: UserId,
    },
    Unfriend {
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(deserialize_with = "user_key")]
        id1: UserId,
        #[serde(deserialize_with = "user_key")]
        id2: UserId,
    },
}

/// A purchase amount and the text it was read from. Flagged output echoes
/// `text` unchanged; the detector only sees `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseAmount {
    pub value: Amount,
    pub text:  String,
}

impl PurchaseAmount {
    /// Amount with its two-decimal rendering as text.
    pub fn new(value: Amount) -> Self {
        Self { value, text: format!("{value:.2}") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Purchase,
    Befriend,
    Unfriend,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Befriend => "befriend",
            Self::Unfriend => "unfriend",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "purchase" => Some(Self::Purchase),
            "befriend" => Some(Self::Befriend),
            "unfriend" => Some(Self::Unfriend),
            _ => None,
        }
    }
}

impl NetworkEvent {
    pub fn purchase(timestamp: &str, id: &str, amount: Amount) -> Self {
        Self::Purchase {
            timestamp: timestamp.to_string(),
            id: id.to_string(),
            amount: PurchaseAmount::new(amount),
        }
    }

    pub fn befriend(id1: &str, id2: &str) -> Self {
        Self::Befriend { timestamp: None, id1: id1.to_string(), id2: id2.to_string() }
    }

    pub fn unfriend(id1: &str, id2: &str) -> Self {
        Self::Unfriend { timestamp: None, id1: id1.to_string(), id2: id2.to_string() }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Purchase { .. } => EventKind::Purchase,
            Self::Befriend { .. } => EventKind::Befriend,
            Self::Unfriend { .. } => EventKind::Unfriend,
        }
    }

    /// Every user key this event references, in record order.
    pub fn users(&self) -> Vec<&str> {
        match self {
            Self::Purchase { id, .. } => vec![id.as_str()],
            Self::Befriend { id1, id2, .. } | Self::Unfriend { id1, id2, .. } => {
                vec![id1.as_str(), id2.as_str()]
            }
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::Purchase { timestamp, .. } => Some(timestamp.as_str()),
            Self::Befriend { timestamp, .. } | Self::Unfriend { timestamp, .. } => {
                timestamp.as_deref()
            }
        }
    }

    /// Render as a single log line in the batch/stream file format.
    pub fn to_log_line(&self) -> String {
        let mut record = serde_json::Map::new();
        record.insert("event_type".into(), Value::from(self.kind().as_str()));
        if let Some(ts) = self.timestamp() {
            record.insert("timestamp".into(), Value::from(ts));
        }
        match self {
            Self::Purchase { id, amount, .. } => {
                record.insert("id".into(), Value::from(id.as_str()));
                record.insert("amount".into(), Value::from(amount.text.as_str()));
            }
            Self::Befriend { id1, id2, .. } | Self::Unfriend { id1, id2, .. } => {
                record.insert("id1".into(), Value::from(id1.as_str()));
                record.insert("id2".into(), Value::from(id2.as_str()));
            }
        }
        Value::Object(record).to_string()
    }
}

/// Parse one non-blank log line. `line_no` is 1-based and only used in errors.
pub fn parse_event(line: &str, line_no: usize) -> AnomalyResult<NetworkEvent> {
    let malformed = |reason: String| AnomalyError::MalformedEvent { line: line_no, reason };

    let value: Value = serde_json::from_str(line.trim()).map_err(|e| malformed(e.to_string()))?;
    let kind = value
        .get("event_type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing event_type".to_string()))?;

    if EventKind::from_name(kind).is_none() {
        return Err(AnomalyError::UnknownEventKind { kind: kind.to_string(), line: line_no });
    }

    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// A purchase that failed the network anomaly test, as written to the
/// flagged output. Field order is the output key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedPurchase {
    pub event_type: String,
    pub timestamp:  String,
    pub id:         UserId,
    pub amount:     String,
    pub mean:       String,
    pub sd:         String,
}

impl FlaggedPurchase {
    pub fn new(timestamp: &str, id: &str, amount: &PurchaseAmount, stats: &SampleStats) -> Self {
        Self {
            event_type: EventKind::Purchase.as_str().to_string(),
            timestamp:  timestamp.to_string(),
            id:         id.to_string(),
            amount:     amount.text.clone(),
            mean:       format!("{:.2}", stats.mean),
            sd:         format!("{:.2}", stats.sd),
        }
    }

    pub fn to_json_line(&self) -> AnomalyResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn user_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserId, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a user id, got {other}"))),
    }
}

fn amount_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PurchaseAmount, D::Error> {
    let (value, text) = match Value::deserialize(deserializer)? {
        Value::String(s) => {
            let value = s
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("amount is not a number: {s:?}")))?;
            (value, s)
        }
        Value::Number(n) => {
            let value = n
                .as_f64()
                .ok_or_else(|| de::Error::custom(format!("amount out of range: {n}")))?;
            (value, n.to_string())
        }
        other => return Err(de::Error::custom(format!("expected an amount, got {other}"))),
    };
    if !value.is_finite() {
        return Err(de::Error::custom(format!("amount is not finite: {value}")));
    }
    Ok(PurchaseAmount { value, text })
}

/// An applied event as persisted to the audit store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub phase:      String,
    pub line:       u64,
    pub event_type: String,
    pub payload:    String, // the log line as read
}
