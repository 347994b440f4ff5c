#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned {status}")]
    Status {
        source_name: String,
        status: reqwest::StatusCode,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the error came from the environment (network, remote data)
    /// rather than from the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Http(_)
                | AppError::Status { .. }
                | AppError::Parse(_)
                | AppError::InvalidRecord(_)
                | AppError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
