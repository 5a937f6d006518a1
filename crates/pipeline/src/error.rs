use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Nothing to cluster: no usable tickets in this run")]
    NothingToCluster,

    #[error("All {dropped} remaining tickets lost to embedding failures")]
    EmbeddingsUnavailable { dropped: usize },

    #[error("Ticket error: {0}")]
    Ticket(#[from] insight_ticket::TicketError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] insight_embedding::EmbeddingError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] insight_cluster::ClusterError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] insight_analytics::AnalyticsError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
