use storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RaterError>;

#[derive(Error, Debug)]
pub enum RaterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Queue error: {0}")]
    QueueError(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Competition {0} not found")]
    CompetitionNotFound(String),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown job kind '{0}'")]
    UnknownJobKind(String),

    #[error("Rating generation failed: {0}")]
    GenerationError(String),

    #[error("Rating generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Generator returned an invalid rating: {0}")]
    InvalidResponse(String),
}

/// Whether a failed job should be handed back to the queue for another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Permanent,
    Retryable,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Retryable => "retryable",
        }
    }
}

impl RaterError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::CompetitionNotFound(_) | Self::InvalidPayload(_) | Self::UnknownJobKind(_) => {
                FailureClass::Permanent
            }
            Self::StorageError(e) if e.is_permanent() => FailureClass::Permanent,
            _ => FailureClass::Retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.failure_class() == FailureClass::Retryable
    }
}
