use thiserror::Error;

pub type DealflowResult<T> = Result<T, DealflowError>;

#[derive(Error, Debug)]
pub enum DealflowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DealflowError {
    pub fn dimension(expected: usize, got: usize) -> Self {
        DealflowError::DimensionMismatch { expected, got }
    }
}

impl From<config::ConfigError> for DealflowError {
    fn from(err: config::ConfigError) -> Self {
        DealflowError::Config(err.to_string())
    }
}
