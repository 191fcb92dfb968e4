/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Restore refused: {0}")]
    RestoreDenied(String),

    #[error(transparent)]
    Ledger(#[from] ledger_core::LedgerError),

    #[error(transparent)]
    Sync(#[from] ledger_sync::SyncError),

    #[error("Sync server error: {0}")]
    Server(#[from] ledger_server_client::ServerClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
