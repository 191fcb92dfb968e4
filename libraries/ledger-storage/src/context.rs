use ledger_core::{LedgerError, Result};

/// The owner that scoped store calls act for
///
/// Holds at most one username. Changing it never touches stored data; it only
/// changes what subsequent scoped reads and writes see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    current: Option<String>,
}

impl UserContext {
    /// A context with no current user
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            current: Some(username.into()),
        }
    }

    pub fn set_current_user(&mut self, username: Option<&str>) {
        self.current = username.map(str::to_string);
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current user, or `NotLoggedIn`
    pub fn require_user(&self) -> Result<&str> {
        self.current_user().ok_or(LedgerError::NotLoggedIn)
    }
}
