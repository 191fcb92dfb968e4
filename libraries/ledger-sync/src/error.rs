use ledger_core::LedgerError;
use thiserror::Error;

use crate::types::RestorePhase;

/// Errors that can occur during sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// A store, remote or validation failure from the layers below
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A complete restore stopped in the given phase
    #[error("Restore failed during {phase}: {source}")]
    Restore {
        phase: RestorePhase,
        #[source]
        source: LedgerError,
    },

    /// Read-back after a local write did not match what was written
    #[error("Read-back mismatch for {collection}: wrote {expected}, found {found}")]
    ReadBackMismatch {
        collection: String,
        expected: usize,
        found: usize,
    },

    /// The outbox worker is gone
    #[error("Outbox worker stopped")]
    WorkerStopped,
}

impl SyncError {
    pub(crate) fn restore(phase: RestorePhase, source: impl Into<LedgerError>) -> Self {
        Self::Restore {
            phase,
            source: source.into(),
        }
    }

    /// The underlying ledger error, if any
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(e) | Self::Restore { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Phase a failed complete restore stopped in
    pub fn restore_phase(&self) -> Option<RestorePhase> {
        match self {
            Self::Restore { phase, .. } => Some(*phase),
            Self::ReadBackMismatch { .. } => Some(RestorePhase::LocalWrite),
            _ => None,
        }
    }
}

impl From<SyncError> for LedgerError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Ledger(e) | SyncError::Restore { source: e, .. } => e,
            other => LedgerError::storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
