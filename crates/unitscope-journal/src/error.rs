use thiserror::Error;

/// Errors raised by the journal reader and the unit inventory
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode journal entry: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Command(String),
}
