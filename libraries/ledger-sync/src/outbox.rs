//! Autosave outbox
//!
//! Local mutations enqueue an autosave task; one worker drains the queue in
//! order, so a push always observes every local write queued before it.
//! Consecutive autosaves for the same user collapse into the last one.

use std::collections::VecDeque;
use std::sync::Arc;

use ledger_core::RemoteAuthority;
use ledger_storage::LocalStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{Result, SyncError};
use crate::snapshot;
use crate::state::StateManager;

#[derive(Debug)]
enum OutboxTask {
    Autosave { username: String },
    Flush(oneshot::Sender<()>),
}

/// Handle to the outbox worker
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboxTask>,
    handle: JoinHandle<()>,
}

impl Outbox {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(
        store: Arc<LocalStore>,
        remote: Option<Arc<dyn RemoteAuthority>>,
        state: StateManager,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(rx, store, remote, state));
        Self { tx, handle }
    }

    /// Queue an autosave of `username`'s snapshot
    pub fn enqueue_autosave(&self, username: &str) {
        let task = OutboxTask::Autosave {
            username: username.to_string(),
        };
        if self.tx.send(task).is_err() {
            error!(username = %username, "Outbox worker stopped, autosave dropped");
        }
    }

    /// Wait until every task queued so far has been processed
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(OutboxTask::Flush(done_tx))
            .map_err(|_| SyncError::WorkerStopped)?;
        done_rx.await.map_err(|_| SyncError::WorkerStopped)
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<OutboxTask>,
    store: Arc<LocalStore>,
    remote: Option<Arc<dyn RemoteAuthority>>,
    state: StateManager,
) {
    let mut pending: VecDeque<OutboxTask> = VecDeque::new();

    loop {
        let task = match pending.pop_front() {
            Some(task) => task,
            None => match rx.recv().await {
                Some(task) => task,
                None => break,
            },
        };

        match task {
            OutboxTask::Autosave { username } => {
                while let Ok(next) = rx.try_recv() {
                    pending.push_back(next);
                }

                let superseded = matches!(
                    pending.front(),
                    Some(OutboxTask::Autosave { username: next }) if *next == username
                );
                if superseded {
                    debug!(username = %username, "Autosave coalesced");
                    continue;
                }

                autosave(&store, remote.as_deref(), &state, &username).await;
            }
            OutboxTask::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Outbox worker finished");
}

/// Rebuild the snapshot, mirror it locally, then push it
///
/// Failures are logged; the local mutation that triggered the autosave stands.
async fn autosave(
    store: &LocalStore,
    remote: Option<&dyn RemoteAuthority>,
    state: &StateManager,
    username: &str,
) {
    let snapshot = match snapshot::build_snapshot(store, username).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(username = %username, error = %e, "Autosave failed to build snapshot");
            return;
        }
    };

    if let Err(e) = snapshot::write_mirror(store, username, &snapshot).await {
        warn!(username = %username, error = %e, "Autosave failed to write local mirror");
    }

    let Some(remote) = remote else {
        debug!(username = %username, "No sync server configured, autosave kept local");
        return;
    };

    let pushing = state.begin_push(username).await;
    if let Err(e) = snapshot::push_snapshot(remote, username, &snapshot).await {
        warn!(username = %username, error = %e, "Autosave push failed");
    }
    if pushing {
        state.end_push().await;
    }
}
