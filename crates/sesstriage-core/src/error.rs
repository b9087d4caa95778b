use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Session source error: {0}")]
    Source(String),

    #[error("Classification worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}
