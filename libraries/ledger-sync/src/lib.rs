//! Ledger synchronization engine
//!
//! Keeps the local store authoritative for reads and writes while mirroring
//! each user's snapshot to the remote authority:
//!
//! - [`SyncEngine`]: session, login-time pull, record mutations with
//!   autosave, merge-import, complete restore and export
//! - [`BackupService`]: backup files (export, import modes, dedup-import, clear)
//! - [`BcryptVerifier`]: the bcrypt credential backend

mod backup;
mod credentials;
mod engine;
mod error;
mod outbox;
mod snapshot;
mod state;
mod types;

// Public exports
pub use backup::{download_filename, BackupService};
pub use credentials::BcryptVerifier;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use state::StateManager;
pub use types::{
    ClearReport, DedupReport, ImportMode, ImportOutcome, ImportReport, LoginOutcome, PullOutcome,
    RestorePhase, RestoreReport, SessionState,
};
