use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnomalyError {
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Malformed event on line {line}: {reason}")]
    MalformedEvent { line: usize, reason: String },

    #[error("Unknown event kind '{kind}' on line {line}")]
    UnknownEventKind { kind: String, line: usize },

    #[error("Edge not found: {id1} -- {id2}")]
    EdgeNotFound { id1: String, id2: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnomalyError {
    /// Only unknown event kinds are skipped; everything else ends the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownEventKind { .. })
    }
}

pub type AnomalyResult<T> = Result<T, AnomalyError>;
