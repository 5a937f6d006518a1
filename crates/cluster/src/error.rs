use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Nothing to cluster: no vectors supplied")]
    NoVectors,

    #[error("Invalid cluster count: {0}")]
    InvalidK(usize),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}
