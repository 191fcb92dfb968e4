use ledger_core::types::User;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the engine session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    PullingRemote,
    Active,
    /// An autosave push for the current user is in flight
    Pushing,
}

/// Result of the login-time pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullOutcome {
    /// Remote records replaced the local ones
    Restored { orders: usize, expenses: usize },
    /// The server has no backup for this user; local state untouched
    NoRemoteBackup,
    /// The server could not be reached (or none is configured); local state untouched
    RemoteUnavailable,
}

/// What a successful login produced
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub pull: PullOutcome,
}

/// How an uploaded snapshot is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Replace the current user's records with the snapshot's
    Merge,
    /// Restore records, settings and account of the snapshot's user
    CompleteRestore,
}

/// Steps of a complete restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestorePhase {
    Parse,
    LocalWrite,
    RemoteSync,
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse",
            Self::LocalWrite => "local-write",
            Self::RemoteSync => "remote-sync",
        };
        f.write_str(name)
    }
}

/// Summary of a merge-import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub legacy: bool,
    pub orders: usize,
    pub expenses: usize,
    /// Legacy files may carry the account entry
    pub user_created: bool,
}

/// Summary of a complete restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub username: String,
    pub imported_orders: usize,
    pub imported_expenses: usize,
    pub restored_settings: bool,
    pub restored_activation: bool,
    /// Data, info and dated backup documents all reached the server
    pub remote_synced: bool,
    /// Why the remote step did not complete
    pub remote_error: Option<String>,
}

/// Summary of a dedup-import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupReport {
    pub imported_orders: usize,
    pub imported_expenses: usize,
    /// Records whose identifier was already taken
    pub skipped: usize,
}

/// Either kind of import summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Merged(ImportReport),
    Restored(RestoreReport),
}

/// Summary of clearing one user's data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub orders: u64,
    pub expenses: u64,
    pub settings: u64,
}
