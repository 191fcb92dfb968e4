use crate::types::SessionState;
use ledger_storage::UserContext;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct Session {
    ctx: UserContext,
    state: SessionState,
}

/// Shared session: the current user and where the engine stands
///
/// Cloned into the outbox worker, which flips `Active` to `Pushing` and back
/// while it pushes for the current user.
#[derive(Debug, Clone)]
pub struct StateManager {
    inner: Arc<RwLock<Session>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session {
                ctx: UserContext::new(),
                state: SessionState::LoggedOut,
            })),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    /// Snapshot of the user context for scoped store calls
    pub async fn context(&self) -> UserContext {
        self.inner.read().await.ctx.clone()
    }

    pub async fn current_user(&self) -> Option<String> {
        self.inner.read().await.ctx.current_user().map(str::to_string)
    }

    pub async fn set_state(&self, state: SessionState) {
        let mut session = self.inner.write().await;
        if session.state != state {
            debug!(from = ?session.state, to = ?state, "Session state change");
            session.state = state;
        }
    }

    /// Switch the current user; never touches stored data
    pub async fn set_current_user(&self, username: Option<&str>) {
        self.inner.write().await.ctx.set_current_user(username);
    }

    /// Clear the user and return to `LoggedOut`
    pub async fn reset(&self) {
        let mut session = self.inner.write().await;
        session.ctx.set_current_user(None);
        session.state = SessionState::LoggedOut;
    }

    /// Copy of the session, to put back if an attempt fails
    pub(crate) async fn checkpoint(&self) -> Session {
        self.inner.read().await.clone()
    }

    /// Put a checkpoint back; a push in flight at checkpoint time resumes as `Active`
    pub(crate) async fn restore(&self, saved: Session) {
        let mut session = self.inner.write().await;
        session.ctx = saved.ctx;
        session.state = match saved.state {
            SessionState::Pushing => SessionState::Active,
            other => other,
        };
        debug!(state = ?session.state, "Session restored");
    }

    /// Enter `Pushing` if `username` is the active user; returns whether it did
    pub async fn begin_push(&self, username: &str) -> bool {
        let mut session = self.inner.write().await;
        if session.state == SessionState::Active && session.ctx.current_user() == Some(username) {
            session.state = SessionState::Pushing;
            true
        } else {
            false
        }
    }

    /// Leave `Pushing`, unless the session moved on meanwhile
    pub async fn end_push(&self) {
        let mut session = self.inner.write().await;
        if session.state == SessionState::Pushing {
            session.state = SessionState::Active;
        }
    }
}
