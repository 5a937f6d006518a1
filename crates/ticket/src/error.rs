use thiserror::Error;

pub type Result<T> = std::result::Result<T, TicketError>;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Malformed record: {context}")]
    MalformedRecord { context: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
