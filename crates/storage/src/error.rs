use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Errors caused by the stored data itself rather than by the store being
    /// unavailable. Repeating the same call fails the same way.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound
                | StorageError::InvalidRecord(_)
                | StorageError::ConstraintViolation(_)
                | StorageError::Serialization(_)
        ) || self.is_foreign_key_violation()
    }
}
