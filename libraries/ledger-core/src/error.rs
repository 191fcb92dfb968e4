/// Core error types for the ledger
use thiserror::Error;

/// Result type alias using `LedgerError`
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Core error type for the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The local database cannot be opened (quota, permissions, corrupt file)
    #[error("Local store unavailable: {0}")]
    StoreUnavailable(String),

    /// Local store query failed on an open connection
    #[error("Storage error: {0}")]
    Storage(String),

    /// Update/delete target is missing from the owner's scope
    #[error("{collection} record not found: {id}")]
    RecordNotFound { collection: String, id: i64 },

    /// Caller-supplied record or account is missing required fields
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// Transport-level failure talking to the remote authority
    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),

    /// The remote answered with a non-success status
    #[error("Remote rejected request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// A snapshot could not be parsed or misses a required top-level key
    #[error("Snapshot malformed: {0}")]
    SnapshotMalformed(String),

    /// No local user and no remote copy either
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Password did not match the stored credential
    #[error("Invalid credentials for {0}")]
    InvalidCredentials(String),

    /// Username or email already registered locally
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    /// Operation needs a current user
    #[error("No user logged in")]
    NotLoggedIn,

    /// Credential hashing backend failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a malformed snapshot error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::SnapshotMalformed(msg.into())
    }

    /// Create a single-message validation error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![msg.into()])
    }

    /// Remote failures degrade to local-only operation instead of aborting
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnreachable(_) | Self::RemoteRejected { .. }
        )
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
