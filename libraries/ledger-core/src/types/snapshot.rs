//! Portable per-user snapshots
//!
//! A snapshot is the serialized union of one user's account entry, owned work
//! orders and expenses, settings bundle and derived stats. Two on-disk shapes
//! are accepted on import:
//!
//! - **current** (`formatVersion` 2):
//!   `{username, exportDate, version, user, settings, data, stats}`
//! - **legacy** (`formatVersion` 1): `{user, data}` without settings or stats
//!
//! The shape is decided once, at parse time, by [`SnapshotFormat::parse`].
//! Files written before the `formatVersion` key existed are recognised by the
//! presence of `settings`, `stats` or `version`.

use crate::error::{LedgerError, Result};
use crate::types::{Expense, NewUser, SettingsBundle, User, UserId, WorkOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `formatVersion` of legacy `{user, data}` files
pub const LEGACY_FORMAT_VERSION: u64 = 1;

/// `formatVersion` written by this crate
pub const CURRENT_FORMAT_VERSION: u64 = 2;

/// Human-facing version string kept for older readers
pub const SNAPSHOT_VERSION: &str = "1.0";

fn current_format_version() -> u64 {
    CURRENT_FORMAT_VERSION
}

fn snapshot_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// Derived aggregates over one user's records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    #[serde(default)]
    pub total_orders: usize,
    #[serde(default)]
    pub total_expenses: usize,
    /// Sum of work order amounts
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_expenses_amount: f64,
}

impl SnapshotStats {
    pub fn compute(orders: &[WorkOrder], expenses: &[Expense]) -> Self {
        Self {
            total_orders: orders.len(),
            total_expenses: expenses.len(),
            total_revenue: orders.iter().map(|o| o.amount).sum(),
            total_expenses_amount: expenses.iter().map(|e| e.amount).sum(),
        }
    }

    /// Revenue minus expenses
    pub fn balance(&self) -> f64 {
        self.total_revenue - self.total_expenses_amount
    }
}

/// Records carried by a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub orders: Vec<WorkOrder>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

/// Account entry as it appears inside a snapshot
///
/// Every field is optional so that partial entries from older files still
/// parse; missing fields are filled from the local account when merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "password", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tutorial_seen: Option<bool>,
    #[serde(default, alias = "userUniqueId")]
    pub unique_device_id: Option<String>,
    #[serde(default)]
    pub imported: Option<bool>,
}

impl From<&User> for SnapshotUser {
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.id),
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
            password_hash: Some(user.password_hash.clone()).filter(|h| !h.is_empty()),
            created_at: Some(user.created_at),
            last_login: user.last_login,
            tutorial_seen: Some(user.tutorial_seen),
            unique_device_id: user.unique_device_id.clone(),
            imported: Some(user.imported),
        }
    }
}

impl SnapshotUser {
    /// Overlay the snapshot's fields on an existing local account
    ///
    /// Fields present in the snapshot win; the row identifier and username
    /// always stay those of the local account.
    pub fn merge_into(&self, existing: &User) -> User {
        User {
            id: existing.id,
            username: existing.username.clone(),
            email: self.email.clone().unwrap_or_else(|| existing.email.clone()),
            password_hash: self
                .password_hash
                .clone()
                .unwrap_or_else(|| existing.password_hash.clone()),
            created_at: self.created_at.unwrap_or(existing.created_at),
            last_login: self.last_login.or(existing.last_login),
            tutorial_seen: self.tutorial_seen.unwrap_or(existing.tutorial_seen),
            unique_device_id: self
                .unique_device_id
                .clone()
                .or_else(|| existing.unique_device_id.clone()),
            imported: self.imported.unwrap_or(existing.imported),
        }
    }

    /// Build a new local account for `username` from the snapshot entry
    ///
    /// An entry without a password hash yields an imported account, since
    /// there is no local credential to check against.
    pub fn to_new_user(&self, username: &str) -> NewUser {
        let password_hash = self.password_hash.clone().unwrap_or_default();
        let imported = self.imported.unwrap_or(false) || password_hash.is_empty();

        NewUser {
            username: username.to_string(),
            email: self
                .email
                .clone()
                .unwrap_or_else(|| username.to_string()),
            password_hash,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            last_login: self.last_login,
            tutorial_seen: self.tutorial_seen.unwrap_or(false),
            unique_device_id: self.unique_device_id.clone(),
            imported,
        }
    }
}

/// Snapshot in the current shape; also the internal representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "current_format_version")]
    pub format_version: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,

    #[serde(default = "snapshot_version")]
    pub version: String,

    #[serde(default)]
    pub user: Option<SnapshotUser>,

    #[serde(default)]
    pub settings: SettingsBundle,

    pub data: SnapshotData,

    #[serde(default)]
    pub stats: SnapshotStats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Assemble a fresh snapshot; stats are derived from the records
    pub fn new(
        username: impl Into<String>,
        user: Option<SnapshotUser>,
        settings: SettingsBundle,
        orders: Vec<WorkOrder>,
        expenses: Vec<Expense>,
    ) -> Self {
        let now = Utc::now();
        let stats = SnapshotStats::compute(&orders, &expenses);
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            username: Some(username.into()),
            export_date: Some(now),
            version: SNAPSHOT_VERSION.to_string(),
            user,
            settings,
            data: SnapshotData { orders, expenses },
            stats,
            saved_at: Some(now),
        }
    }

    /// Username from the top level, falling back to the embedded account
    pub fn owner(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.username.as_deref()))
            .filter(|u| !u.trim().is_empty())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Snapshot in the legacy `{user, data}` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySnapshot {
    pub user: SnapshotUser,
    pub data: SnapshotData,
}

impl From<LegacySnapshot> for Snapshot {
    fn from(legacy: LegacySnapshot) -> Self {
        let stats = SnapshotStats::compute(&legacy.data.orders, &legacy.data.expenses);
        Self {
            format_version: LEGACY_FORMAT_VERSION,
            username: legacy.user.username.clone(),
            export_date: None,
            version: SNAPSHOT_VERSION.to_string(),
            user: Some(legacy.user),
            settings: SettingsBundle::default(),
            data: legacy.data,
            stats,
            saved_at: None,
        }
    }
}

/// A parsed snapshot, tagged with the shape it was decoded from
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotFormat {
    Legacy(LegacySnapshot),
    Current(Snapshot),
}

impl SnapshotFormat {
    /// Parse snapshot file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| LedgerError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| LedgerError::malformed("snapshot must be a JSON object"))?;

        let format_version = match object.get("formatVersion") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| LedgerError::malformed("formatVersion must be an integer"))?,
            None => Self::infer_format_version(object),
        };

        match format_version {
            LEGACY_FORMAT_VERSION => serde_json::from_value(value)
                .map(Self::Legacy)
                .map_err(|e| LedgerError::malformed(format!("legacy snapshot: {e}"))),
            CURRENT_FORMAT_VERSION => serde_json::from_value(value)
                .map(Self::Current)
                .map_err(|e| LedgerError::malformed(format!("snapshot: {e}"))),
            other => Err(LedgerError::malformed(format!(
                "unsupported formatVersion {other}"
            ))),
        }
    }

    fn infer_format_version(object: &serde_json::Map<String, Value>) -> u64 {
        let has_current_keys = ["settings", "stats", "version"]
            .iter()
            .any(|key| object.contains_key(*key));

        if !has_current_keys && object.contains_key("user") {
            LEGACY_FORMAT_VERSION
        } else {
            CURRENT_FORMAT_VERSION
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Legacy(legacy) => legacy.user.username.as_deref(),
            Self::Current(snapshot) => snapshot.owner(),
        }
    }

    pub fn data(&self) -> &SnapshotData {
        match self {
            Self::Legacy(legacy) => &legacy.data,
            Self::Current(snapshot) => &snapshot.data,
        }
    }

    /// Normalize to the internal snapshot type
    pub fn into_snapshot(self) -> Snapshot {
        match self {
            Self::Legacy(legacy) => legacy.into(),
            Self::Current(snapshot) => snapshot,
        }
    }
}
