//! Backup file service
//!
//! Export of one user's snapshot, the two upload paths (merge-import and
//! complete restore), the identifier-deduplicating import, and clearing a
//! user's data.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use ledger_core::types::{Expense, OwnedRecord, Snapshot, SnapshotData, SnapshotFormat, WorkOrder};
use ledger_core::LedgerError;
use ledger_storage::UserContext;
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::SyncEngine;
use crate::error::Result;
use crate::snapshot;
use crate::types::{ClearReport, DedupReport, ImportMode, ImportOutcome};

/// Name offered for a downloaded backup file
pub fn download_filename(date: NaiveDate) -> String {
    format!("OT_Backup_{}-{}.json", date.month(), date.year())
}

/// Backup and restore operations on top of a [`SyncEngine`]
#[derive(Clone)]
pub struct BackupService {
    engine: Arc<SyncEngine>,
}

impl BackupService {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Build the snapshot of `username`
    ///
    /// Assigns a unique identifier to the user if they lack one and refreshes
    /// the stored stats. Nothing is pushed.
    pub async fn export_snapshot(&self, username: &str) -> Result<Snapshot> {
        let snapshot = snapshot::build_snapshot(self.engine.store(), username).await?;
        info!(
            username = %username,
            orders = snapshot.stats.total_orders,
            expenses = snapshot.stats.total_expenses,
            "Snapshot exported"
        );
        Ok(snapshot)
    }

    pub async fn export_json(&self, username: &str) -> Result<String> {
        let snapshot = self.export_snapshot(username).await?;
        Ok(snapshot.to_json_pretty()?)
    }

    /// Apply an uploaded backup file with the chosen mode
    pub async fn import_snapshot(&self, contents: &str, mode: ImportMode) -> Result<ImportOutcome> {
        match mode {
            ImportMode::Merge => {
                let format = SnapshotFormat::parse(contents)?;
                if format.owner().is_none() {
                    return Err(LedgerError::malformed("username is missing").into());
                }
                let report = self.engine.import_parsed(format).await?;
                Ok(ImportOutcome::Merged(report))
            }
            ImportMode::CompleteRestore => {
                let report = self.engine.import_complete_user_data(contents).await?;
                Ok(ImportOutcome::Restored(report))
            }
        }
    }

    /// Add the file's records whose identifiers are not taken yet
    ///
    /// Existing records are never modified or removed. Identifiers are
    /// checked across every owner; kept records retain their identifier and
    /// become the current user's.
    pub async fn import_data(&self, contents: &str) -> Result<DedupReport> {
        let raw: Value =
            serde_json::from_str(contents).map_err(|e| LedgerError::malformed(e.to_string()))?;
        for key in ["version", "data"] {
            if raw.get(key).is_none() {
                return Err(LedgerError::malformed(format!("missing `{key}`")).into());
            }
        }
        let data: SnapshotData = serde_json::from_value(raw["data"].clone())
            .map_err(|e| LedgerError::malformed(e.to_string()))?;

        let ctx = self.engine.context().await;
        let username = ctx.require_user()?.to_string();

        let mut report = DedupReport::default();
        let (added, skipped) = self.add_missing(&ctx, data.orders).await?;
        report.imported_orders = added;
        report.skipped += skipped;
        let (added, skipped) = self.add_missing(&ctx, data.expenses).await?;
        report.imported_expenses = added;
        report.skipped += skipped;

        info!(
            username = %username,
            orders = report.imported_orders,
            expenses = report.imported_expenses,
            skipped = report.skipped,
            "Data imported"
        );
        self.engine.enqueue_autosave(&username);
        Ok(report)
    }

    async fn add_missing<T: OwnedRecord>(
        &self,
        ctx: &UserContext,
        records: Vec<T>,
    ) -> Result<(usize, usize)> {
        let store = self.engine.store();
        let (mut added, mut skipped) = (0, 0);

        for record in records {
            match record.id() {
                Some(id) if store.id_exists::<T>(id).await? => {
                    debug!(id, collection = %T::COLLECTION, "Record already present, skipped");
                    skipped += 1;
                }
                Some(_) => {
                    store.restore(ctx, record).await?;
                    added += 1;
                }
                None => {
                    store.insert(ctx, record).await?;
                    added += 1;
                }
            }
        }

        Ok((added, skipped))
    }

    /// Delete every record and setting owned by `username`
    pub async fn clear_all_owned_data(&self, username: &str) -> Result<ClearReport> {
        let store = self.engine.store();

        let report = ClearReport {
            orders: store.clear_owned_by::<WorkOrder>(username).await?,
            expenses: store.clear_owned_by::<Expense>(username).await?,
            settings: store.clear_user_settings(username).await?,
        };
        store.delete_stats(username).await?;

        info!(
            username = %username,
            orders = report.orders,
            expenses = report.expenses,
            settings = report.settings,
            "User data cleared"
        );
        Ok(report)
    }
}
