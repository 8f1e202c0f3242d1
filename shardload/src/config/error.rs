use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid chunk size \"{0}\"")]
    InvalidChunkSize(String),
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
}
