//! Synchronization engine
//!
//! Owns the session (current user and state) and sequences every operation
//! that spans the local store and the remote authority: login with the
//! login-time pull, record mutations with autosave, merge-import, complete
//! restore and export.
//!
//! Store errors propagate. Remote errors are logged and absorbed, except on
//! the explicit export path.

use std::sync::Arc;

use chrono::Utc;
use ledger_core::types::{
    backup_filename, categories_filename, data_filename, info_filename, CategoriesDocument,
    CompanyInfo, CustomCategories, Expense, LegacySnapshot, NewUser, OwnedRecord, RecordId,
    Snapshot, SnapshotFormat, User, UserDataDocument, UserInfoDocument, WorkOrder,
};
use ledger_core::validation::validate_registration;
use ledger_core::{CredentialVerifier, LedgerError, RemoteAuthority};
use ledger_storage::{LocalStore, UserContext};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::outbox::Outbox;
use crate::snapshot;
use crate::state::StateManager;
use crate::types::{
    ImportReport, LoginOutcome, PullOutcome, RestorePhase, RestoreReport, SessionState,
};

/// Local-first synchronization engine
pub struct SyncEngine {
    store: Arc<LocalStore>,
    remote: Option<Arc<dyn RemoteAuthority>>,
    verifier: Arc<dyn CredentialVerifier>,
    state: StateManager,
    outbox: Outbox,
}

impl SyncEngine {
    /// Create the engine and spawn its outbox worker
    ///
    /// Must be called from within a tokio runtime. Without a remote the engine
    /// runs local-only: pulls report `RemoteUnavailable` and autosaves stop
    /// at the local mirror.
    pub fn new(
        store: Arc<LocalStore>,
        remote: Option<Arc<dyn RemoteAuthority>>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let state = StateManager::new();
        let outbox = Outbox::spawn(store.clone(), remote.clone(), state.clone());

        Self {
            store,
            remote,
            verifier,
            state,
            outbox,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub async fn state(&self) -> SessionState {
        self.state.state().await
    }

    pub async fn current_user(&self) -> Option<String> {
        self.state.current_user().await
    }

    /// User context for scoped store calls
    pub async fn context(&self) -> UserContext {
        self.state.context().await
    }

    async fn require_user(&self) -> Result<String> {
        Ok(self.current_user().await.ok_or(LedgerError::NotLoggedIn)?)
    }

    /// Wait for queued autosaves to finish
    pub async fn flush(&self) -> Result<()> {
        self.outbox.flush().await
    }

    pub(crate) fn enqueue_autosave(&self, username: &str) {
        self.outbox.enqueue_autosave(username);
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create a local account, mirror it on the server, and push its first snapshot
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = email.trim();
        validate_registration(username, email, password)?;

        if self.store.find_user(username).await?.is_some() {
            return Err(LedgerError::UserAlreadyExists(username.to_string()).into());
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(LedgerError::UserAlreadyExists(email.to_string()).into());
        }

        let hash = self.verifier.hash_password(password)?;
        let user = self
            .store
            .insert_user(NewUser::local(username, email, hash))
            .await?;
        info!(username = %username, "User registered locally");

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.register(username, email, password).await {
                warn!(
                    username = %username,
                    error = %e,
                    "Server registration failed, continuing locally"
                );
            }
        }

        self.enqueue_autosave(username);
        Ok(user)
    }

    /// Authenticate, make the user current, and pull their remote backup
    ///
    /// A user unknown locally is looked up on the server and materialized as
    /// an imported account when the server holds both their documents.
    ///
    /// A failed authentication leaves the previous session in place. A
    /// failure after that logs out.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let username = username.trim();
        let previous = self.state.checkpoint().await;
        self.state.set_state(SessionState::Authenticating).await;

        let (user, prefetched) = match self.authenticate(username, password).await {
            Ok(found) => found,
            Err(e) => {
                self.state.restore(previous).await;
                return Err(e);
            }
        };

        match self.activate(username, user, prefetched).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(username = %username, error = %e, "Login aborted after authentication");
                self.state.reset().await;
                Err(e)
            }
        }
    }

    /// Make an authenticated user current and run the login-time pull
    async fn activate(
        &self,
        username: &str,
        user: User,
        prefetched: Option<(UserInfoDocument, UserDataDocument)>,
    ) -> Result<LoginOutcome> {
        self.store.touch_last_login(username).await?;
        self.state.set_current_user(Some(username)).await;
        self.state.set_state(SessionState::PullingRemote).await;

        let pull = match prefetched {
            Some((info, data)) => self.apply_remote(username, Some(info), data).await?,
            None => self.pull_remote(username).await?,
        };

        self.state.set_state(SessionState::Active).await;
        let user = self.store.find_user(username).await?.unwrap_or(user);

        info!(username = %username, pull = ?pull, "Login complete");
        Ok(LoginOutcome { user, pull })
    }

    /// Resolve the account, returning remote documents already fetched
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, Option<(UserInfoDocument, UserDataDocument)>)> {
        let Some(mut user) = self.store.find_user(username).await? else {
            let (user, info, data) = self.materialize_remote_user(username).await?;
            self.upgrade_imported_user(user.clone(), password).await?;
            return Ok((user, Some((info, data))));
        };

        if user.requires_password() {
            if !self.verifier.verify_password(password, &user.password_hash)? {
                warn!(username = %username, "Invalid password");
                return Err(LedgerError::InvalidCredentials(username.to_string()).into());
            }
        } else {
            user = self.upgrade_imported_user(user, password).await?;
        }

        Ok((user, None))
    }

    /// Look the user up on the server and create an imported local account
    async fn materialize_remote_user(
        &self,
        username: &str,
    ) -> Result<(User, UserInfoDocument, UserDataDocument)> {
        let not_found = || SyncError::from(LedgerError::UserNotFound(username.to_string()));
        let remote = self.remote.as_ref().ok_or_else(not_found)?;

        let info = remote.load_info(username).await;
        let data = remote.load_data(username).await;
        let (info, data) = match (info, data) {
            (Ok(Some(info)), Ok(Some(data)))
                if info.username == username && data.username == username =>
            {
                (info, data)
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(username = %username, error = %e, "Cannot resolve user remotely");
                return Err(not_found());
            }
            _ => return Err(not_found()),
        };

        let new_user = NewUser {
            username: username.to_string(),
            email: info.email.clone().unwrap_or_else(|| username.to_string()),
            password_hash: String::new(),
            created_at: info.created_at.unwrap_or_else(Utc::now),
            last_login: Some(Utc::now()),
            tutorial_seen: true,
            unique_device_id: info.unique_device_id.clone(),
            imported: true,
        };
        let user = self.store.insert_user(new_user).await?;
        info!(username = %username, "User materialized from server backup");

        Ok((user, info, data))
    }

    /// Give an imported account a local password once the server confirms it
    async fn upgrade_imported_user(&self, mut user: User, password: &str) -> Result<User> {
        let Some(remote) = &self.remote else {
            return Ok(user);
        };

        match remote.login(&user.username, password).await {
            Ok(_) => {
                user.password_hash = self.verifier.hash_password(password)?;
                user.imported = false;
                self.store.update_user(&user).await?;
                info!(username = %user.username, "Imported user now has a local password");
            }
            Err(e) => {
                debug!(username = %user.username, error = %e, "Server did not confirm password");
            }
        }
        Ok(user)
    }

    /// Return to the logged-out state; stored data stays
    pub async fn logout(&self) -> Result<()> {
        self.flush().await?;
        if let Some(username) = self.current_user().await {
            info!(username = %username, "Logged out");
        }
        self.state.reset().await;
        Ok(())
    }

    pub async fn mark_tutorial_seen(&self) -> Result<()> {
        let username = self.require_user().await?;
        if let Some(mut user) = self.store.find_user(&username).await? {
            user.tutorial_seen = true;
            self.store.update_user(&user).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Login-time pull
    // =========================================================================

    /// Fetch the user's remote backup and apply it over the local state
    ///
    /// Never fails because of the remote: an unreachable server or a missing
    /// backup leave local state as it is.
    pub async fn pull_remote(&self, username: &str) -> Result<PullOutcome> {
        let Some(remote) = &self.remote else {
            return Ok(PullOutcome::RemoteUnavailable);
        };

        let info = match remote.load_info(username).await {
            Ok(info) => info,
            Err(e) => {
                warn!(username = %username, error = %e, "Server unreachable, keeping local data");
                return Ok(PullOutcome::RemoteUnavailable);
            }
        };
        let data = match remote.load_data(username).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!(username = %username, "No remote backup");
                return Ok(PullOutcome::NoRemoteBackup);
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Server unreachable, keeping local data");
                return Ok(PullOutcome::RemoteUnavailable);
            }
        };

        self.apply_remote(username, info, data).await
    }

    /// Replace owned records and overwrite settings with the remote copy
    async fn apply_remote(
        &self,
        username: &str,
        info: Option<UserInfoDocument>,
        data: UserDataDocument,
    ) -> Result<PullOutcome> {
        if data.username != username {
            warn!(
                username = %username,
                owner = %data.username,
                "Remote backup belongs to another user, ignoring it"
            );
            return Ok(PullOutcome::NoRemoteBackup);
        }
        let info = info.filter(|info| {
            let owned = info.username == username;
            if !owned {
                warn!(
                    username = %username,
                    owner = %info.username,
                    "Remote settings belong to another user, ignoring them"
                );
            }
            owned
        });

        let ctx = UserContext::for_user(username);

        self.store.clear_owned::<WorkOrder>(&ctx).await?;
        self.store.clear_owned::<Expense>(&ctx).await?;

        let orders = data.data.orders.len();
        let expenses = data.data.expenses.len();
        for order in data.data.orders {
            self.store.restore(&ctx, order).await?;
        }
        for expense in data.data.expenses {
            self.store.restore(&ctx, expense).await?;
        }

        if let Some(info) = info {
            if let Some(company) = info.company_info() {
                self.store.set_company_info(username, Some(company)).await?;
            }
            if let Some(activation) = &info.activation {
                let stamped = activation.for_user(username);
                self.store.set_activation(username, Some(&stamped)).await?;
            }
            if let Some(theme) = &info.settings.theme {
                self.store.set_theme(theme).await?;
            }
        }

        info!(username = %username, orders, expenses, "Remote backup applied");
        Ok(PullOutcome::Restored { orders, expenses })
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Validate and insert a record for the current user
    pub async fn add<T: OwnedRecord>(&self, record: T) -> Result<T> {
        let ctx = self.context().await;
        let username = ctx.require_user()?.to_string();
        record.validate()?;

        let saved = self.store.insert(&ctx, record).await?;
        self.enqueue_autosave(&username);
        Ok(saved)
    }

    /// Validate and update a record; `false` if it is not the current user's
    pub async fn update<T: OwnedRecord>(&self, record: &T) -> Result<bool> {
        let ctx = self.context().await;
        let username = ctx.require_user()?.to_string();
        record.validate()?;

        let updated = self.store.update(&ctx, record).await?;
        if updated {
            self.enqueue_autosave(&username);
        }
        Ok(updated)
    }

    pub async fn delete<T: OwnedRecord>(&self, id: RecordId) -> Result<bool> {
        let ctx = self.context().await;
        let username = ctx.require_user()?.to_string();

        let deleted = self.store.delete_owned::<T>(&ctx, id).await?;
        if deleted {
            self.enqueue_autosave(&username);
        }
        Ok(deleted)
    }

    /// The current user's records (empty when logged out)
    pub async fn list<T: OwnedRecord>(&self) -> Result<Vec<T>> {
        let ctx = self.context().await;
        Ok(self.store.read_all(&ctx).await?)
    }

    // =========================================================================
    // Merge-import
    // =========================================================================

    /// Apply an uploaded snapshot to the current user
    ///
    /// Current-shape snapshots replace the current user's records. Legacy
    /// snapshots are upserted on top of them, and may create the embedded
    /// account when it is the current user's and missing locally.
    pub async fn import(&self, contents: &str) -> Result<ImportReport> {
        let format = SnapshotFormat::parse(contents)?;
        self.import_parsed(format).await
    }

    pub(crate) async fn import_parsed(&self, format: SnapshotFormat) -> Result<ImportReport> {
        let ctx = self.context().await;
        let username = ctx.require_user()?.to_string();

        let report = match format {
            SnapshotFormat::Current(snapshot) => self.import_current(&ctx, snapshot).await?,
            SnapshotFormat::Legacy(legacy) => self.import_legacy(&ctx, legacy).await?,
        };

        info!(
            username = %username,
            legacy = report.legacy,
            orders = report.orders,
            expenses = report.expenses,
            "Snapshot imported"
        );
        self.enqueue_autosave(&username);
        Ok(report)
    }

    async fn import_current(&self, ctx: &UserContext, snapshot: Snapshot) -> Result<ImportReport> {
        self.store.clear_owned::<WorkOrder>(ctx).await?;
        self.store.clear_owned::<Expense>(ctx).await?;

        let mut report = ImportReport::default();
        for order in snapshot.data.orders {
            self.store.insert(ctx, order).await?;
            report.orders += 1;
        }
        for expense in snapshot.data.expenses {
            self.store.insert(ctx, expense).await?;
            report.expenses += 1;
        }
        Ok(report)
    }

    async fn import_legacy(
        &self,
        ctx: &UserContext,
        legacy: LegacySnapshot,
    ) -> Result<ImportReport> {
        let mut report = ImportReport {
            legacy: true,
            ..ImportReport::default()
        };

        let current = ctx.require_user()?;
        if legacy.user.username.as_deref() == Some(current)
            && self.store.find_user(current).await?.is_none()
        {
            self.store.insert_user(legacy.user.to_new_user(current)).await?;
            report.user_created = true;
        }

        for order in legacy.data.orders {
            self.store.upsert(ctx, order).await?;
            report.orders += 1;
        }
        for expense in legacy.data.expenses {
            self.store.upsert(ctx, expense).await?;
            report.expenses += 1;
        }
        Ok(report)
    }

    // =========================================================================
    // Complete restore
    // =========================================================================

    /// Restore a user's records, settings and account from a snapshot file
    ///
    /// The snapshot's user becomes the current user. Parse and local-write
    /// failures abort with their phase; a failed push is reported in the
    /// result without undoing the local restore.
    pub async fn import_complete_user_data(&self, contents: &str) -> Result<RestoreReport> {
        let parse_error = |e: LedgerError| SyncError::restore(RestorePhase::Parse, e);
        let raw: Value = serde_json::from_str(contents)
            .map_err(|e| parse_error(LedgerError::malformed(e.to_string())))?;
        let snapshot = SnapshotFormat::from_value(raw.clone())
            .map_err(parse_error)?
            .into_snapshot();
        let username = snapshot
            .owner()
            .map(str::to_string)
            .ok_or_else(|| parse_error(LedgerError::malformed("username is missing")))?;

        info!(username = %username, "Complete restore started");
        let mut report = self.restore_locally(&username, snapshot).await?;

        match self.push_restored(&username, &raw).await {
            Ok(()) => report.remote_synced = true,
            Err(e) => {
                warn!(
                    username = %username,
                    phase = %RestorePhase::RemoteSync,
                    error = %e,
                    "Restore not synced to server"
                );
                report.remote_error = Some(e.to_string());
            }
        }

        info!(
            username = %username,
            orders = report.imported_orders,
            expenses = report.imported_expenses,
            remote_synced = report.remote_synced,
            "Complete restore finished"
        );
        Ok(report)
    }

    async fn restore_locally(&self, username: &str, snapshot: Snapshot) -> Result<RestoreReport> {
        let local = |e: LedgerError| SyncError::restore(RestorePhase::LocalWrite, e);
        let ctx = UserContext::for_user(username);

        self.state.set_current_user(Some(username)).await;
        self.state.set_state(SessionState::Active).await;

        // Drop everything the user owns, whoever was current before
        self.store.clear_owned_by::<WorkOrder>(username).await.map_err(local)?;
        self.store.clear_owned_by::<Expense>(username).await.map_err(local)?;

        let expected_orders = snapshot.data.orders.len();
        let expected_expenses = snapshot.data.expenses.len();

        for mut order in snapshot.data.orders {
            order.set_id(None);
            self.store.insert(&ctx, order).await.map_err(local)?;
        }
        for mut expense in snapshot.data.expenses {
            expense.set_id(None);
            self.store.insert(&ctx, expense).await.map_err(local)?;
        }

        let settings = &snapshot.settings;
        if let Some(company) = &settings.company_info {
            self.store.set_company_info(username, Some(company)).await.map_err(local)?;
        }
        if let Some(activation) = &settings.activation {
            self.store.set_activation(username, Some(activation)).await.map_err(local)?;
        }
        if let Some(categories) = &settings.categories {
            self.store.set_custom_categories(username, Some(categories)).await.map_err(local)?;
        }
        self.store.set_theme(&settings.theme).await.map_err(local)?;

        if let Some(entry) = &snapshot.user {
            match self.store.find_user(username).await.map_err(local)? {
                Some(existing) => {
                    self.store.update_user(&entry.merge_into(&existing)).await.map_err(local)?;
                }
                None => {
                    self.store.insert_user(entry.to_new_user(username)).await.map_err(local)?;
                }
            }
        }

        let stored = self.store.count_owned_by::<WorkOrder>(username).await.map_err(local)?;
        let found_orders = read_back(stored);
        if found_orders != expected_orders {
            return Err(SyncError::ReadBackMismatch {
                collection: "work_orders".into(),
                expected: expected_orders,
                found: found_orders,
            });
        }
        let stored = self.store.count_owned_by::<Expense>(username).await.map_err(local)?;
        let found_expenses = read_back(stored);
        if found_expenses != expected_expenses {
            return Err(SyncError::ReadBackMismatch {
                collection: "expenses".into(),
                expected: expected_expenses,
                found: found_expenses,
            });
        }

        Ok(RestoreReport {
            username: username.to_string(),
            imported_orders: found_orders,
            imported_expenses: found_expenses,
            restored_settings: settings.company_info.is_some()
                || settings.activation.is_some()
                || settings.categories.is_some(),
            restored_activation: settings.activation.is_some(),
            remote_synced: false,
            remote_error: None,
        })
    }

    /// Push data, info and the dated backup copy of a restored user
    async fn push_restored(&self, username: &str, raw: &Value) -> ledger_core::Result<()> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| LedgerError::RemoteUnreachable("no sync server configured".into()))?;

        let snapshot = snapshot::build_snapshot(&self.store, username).await?;
        snapshot::write_mirror(&self.store, username, &snapshot).await?;

        let data_doc = serde_json::to_value(UserDataDocument::from_snapshot(username, &snapshot))?;
        remote.save_document(&data_filename(username), &data_doc).await?;

        let info_doc = serde_json::to_value(UserInfoDocument::from_snapshot(username, &snapshot))?;
        remote.save_document(&info_filename(username), &info_doc).await?;

        let dated = backup_filename(username, Utc::now().date_naive());
        remote.save_document(&dated, raw).await?;
        Ok(())
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Build the current user's snapshot and push it to the server
    ///
    /// Unlike autosave, remote failures are returned to the caller.
    pub async fn export_user_data(&self) -> Result<Snapshot> {
        let username = self.require_user().await?;
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| LedgerError::RemoteUnreachable("no sync server configured".into()))?;

        let snapshot = snapshot::build_snapshot(&self.store, &username).await?;
        snapshot::write_mirror(&self.store, &username, &snapshot).await?;
        snapshot::push_snapshot(&**remote, &username, &snapshot).await?;
        Ok(snapshot)
    }

    // =========================================================================
    // Company info and custom categories
    // =========================================================================

    pub async fn company_info(&self) -> Result<Option<CompanyInfo>> {
        let username = self.require_user().await?;
        Ok(self.store.company_info(&username).await?)
    }

    /// Save the company profile locally, then on the server (best effort)
    pub async fn save_company_info(&self, info: &CompanyInfo) -> Result<()> {
        let username = self.require_user().await?;
        self.store.set_company_info(&username, Some(info)).await?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.update_company_info(&username, info).await {
                warn!(username = %username, error = %e, "Company info not synced to server");
            }
        }

        self.enqueue_autosave(&username);
        Ok(())
    }

    /// Save custom categories locally, then push their document (best effort)
    pub async fn save_custom_categories(&self, categories: &CustomCategories) -> Result<()> {
        let username = self.require_user().await?;
        self.store.set_custom_categories(&username, Some(categories)).await?;

        if let Some(remote) = &self.remote {
            let doc = serde_json::to_value(CategoriesDocument::new(&username, categories.clone()))
                .map_err(LedgerError::from)?;
            if let Err(e) = remote.save_document(&categories_filename(&username), &doc).await {
                warn!(username = %username, error = %e, "Custom categories not synced to server");
            }
        }
        Ok(())
    }

    /// Custom categories, preferring the server copy and caching it locally
    pub async fn load_custom_categories(&self) -> Result<Option<CustomCategories>> {
        let username = self.require_user().await?;

        if let Some(remote) = &self.remote {
            match remote.load_categories(&username).await {
                Ok(Some(doc)) => {
                    self.store
                        .set_custom_categories(&username, Some(&doc.categories))
                        .await?;
                    return Ok(Some(doc.categories));
                }
                Ok(None) => debug!(username = %username, "No custom categories on server"),
                Err(e) => warn!(username = %username, error = %e, "Using local custom categories"),
            }
        }

        Ok(self.store.custom_categories(&username).await?)
    }
}

fn read_back(count: i64) -> usize {
    usize::try_from(count).unwrap_or_default()
}
