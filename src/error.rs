use thiserror::Error;

/// Error taxonomy for the blog store. Each kind maps to a distinct HTTP
/// status at the API layer; the store itself never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or incomplete input, detected before any write occurs.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Language code outside the supported set.
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),

    /// The addressed blog or file does not exist.
    #[error("not found")]
    NotFound,

    /// Uniqueness violation that raced past pre-validation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying database or I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Storage(err.into()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
