/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database file cannot be opened
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

impl From<StorageError> for ledger_core::LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) | StorageError::Migration(msg) => {
                ledger_core::LedgerError::StoreUnavailable(msg)
            }
            other => ledger_core::LedgerError::storage(other.to_string()),
        }
    }
}
