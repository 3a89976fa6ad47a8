use thiserror::Error;

// Custom Result type alias for convenient use across the project
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid generation parameters: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
