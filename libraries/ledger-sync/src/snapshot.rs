//! Building and pushing per-user snapshots

use ledger_core::types::{
    data_filename, info_filename, Expense, Snapshot, SnapshotUser, User, UserDataDocument,
    UserInfoDocument, WorkOrder,
};
use ledger_core::{RemoteAuthority, Result};
use ledger_storage::LocalStore;
use tracing::{debug, info};

/// Give the user a unique identifier if it predates them
pub async fn ensure_unique_device_id(store: &LocalStore, username: &str) -> Result<Option<User>> {
    let Some(mut user) = store.find_user(username).await? else {
        return Ok(None);
    };

    if user.unique_device_id.is_none() {
        let id = uuid::Uuid::new_v4().to_string().to_uppercase();
        info!(username = %username, "Assigning unique identifier");
        user.unique_device_id = Some(id);
        store.update_user(&user).await?;
    }

    Ok(Some(user))
}

/// Assemble the current snapshot of one user and refresh their stats row
pub async fn build_snapshot(store: &LocalStore, username: &str) -> Result<Snapshot> {
    let orders: Vec<WorkOrder> = store.read_owned_by(username).await?;
    let expenses: Vec<Expense> = store.read_owned_by(username).await?;
    let user = ensure_unique_device_id(store, username).await?;
    let settings = store.load_settings(username).await?;

    let snapshot = Snapshot::new(
        username,
        user.as_ref().map(SnapshotUser::from),
        settings,
        orders,
        expenses,
    );
    store.set_stats(username, &snapshot.stats).await?;

    debug!(
        username = %username,
        orders = snapshot.stats.total_orders,
        expenses = snapshot.stats.total_expenses,
        "Snapshot built"
    );
    Ok(snapshot)
}

/// Keep the latest snapshot locally for crash recovery
pub async fn write_mirror(store: &LocalStore, username: &str, snapshot: &Snapshot) -> Result<()> {
    store
        .set_backup_mirror(username, &serde_json::to_value(snapshot)?)
        .await
}

/// Push the info document, then the data document
pub async fn push_snapshot(
    remote: &dyn RemoteAuthority,
    username: &str,
    snapshot: &Snapshot,
) -> Result<()> {
    let info_doc = serde_json::to_value(UserInfoDocument::from_snapshot(username, snapshot))?;
    remote.save_document(&info_filename(username), &info_doc).await?;

    let data_doc = serde_json::to_value(UserDataDocument::from_snapshot(username, snapshot))?;
    remote.save_document(&data_filename(username), &data_doc).await?;

    info!(username = %username, "Snapshot pushed to server");
    Ok(())
}
