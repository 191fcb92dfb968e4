//! Scoped settings
//!
//! Settings are key-value pairs with JSON-serialized values, stored either
//! globally or per username. Typed helpers cover the keys the ledger uses.
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_storage::settings::{self, SettingsScope};
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let dark = serde_json::json!("dark");
//! settings::set_setting(pool, &SettingsScope::Global, settings::SETTING_THEME, &dark).await?;
//!
//! let theme = settings::get_theme(pool).await?;
//! assert_eq!(theme.as_str(), "dark");
//! # Ok(())
//! # }
//! ```

use ledger_core::types::{Activation, CompanyInfo, CustomCategories, SettingsBundle, Theme};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::error::Result;

/// UI theme (global)
pub const SETTING_THEME: &str = "theme";

/// Company profile
pub const SETTING_COMPANY_INFO: &str = "company_info";

/// License activation record
pub const SETTING_ACTIVATION: &str = "activation";

/// Custom work order categories
pub const SETTING_WORK_ORDER_CATEGORIES: &str = "categories.work_orders";

/// Custom expense categories
pub const SETTING_EXPENSE_CATEGORIES: &str = "categories.expenses";

/// Last snapshot, kept for crash recovery
pub const SETTING_BACKUP: &str = "backup";

/// Where a setting lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsScope {
    Global,
    User(String),
}

impl SettingsScope {
    pub fn user(username: impl Into<String>) -> Self {
        Self::User(username.into())
    }

    fn key(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::User(name) => format!("user:{name}"),
        }
    }
}

/// Get a single setting value
///
/// Returns `Ok(None)` if the setting is not stored
pub async fn get_setting(
    pool: &SqlitePool,
    scope: &SettingsScope,
    key: &str,
) -> Result<Option<Value>> {
    let row = sqlx::query("SELECT value FROM settings WHERE scope = ? AND key = ?")
        .bind(scope.key())
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let raw: String = row.get("value");
            Ok(Some(serde_json::from_str(&raw)?))
        }
        None => Ok(None),
    }
}

/// Set a setting value, replacing any previous one
pub async fn set_setting(
    pool: &SqlitePool,
    scope: &SettingsScope,
    key: &str,
    value: &Value,
) -> Result<()> {
    let value_str = serde_json::to_string(value)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO settings (scope, key, value, updated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(scope, key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
    )
    .bind(scope.key())
    .bind(key)
    .bind(value_str)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_setting(pool: &SqlitePool, scope: &SettingsScope, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE scope = ? AND key = ?")
        .bind(scope.key())
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every setting in a scope as `(key, value)` pairs, ordered by key
pub async fn get_all_settings(
    pool: &SqlitePool,
    scope: &SettingsScope,
) -> Result<Vec<(String, Value)>> {
    let rows = sqlx::query("SELECT key, value FROM settings WHERE scope = ? ORDER BY key")
        .bind(scope.key())
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let raw: String = row.get("value");
            Ok((row.get("key"), serde_json::from_str(&raw)?))
        })
        .collect()
}

/// Remove every setting stored for a user
pub async fn clear_user_settings(pool: &SqlitePool, username: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM settings WHERE scope = ?")
        .bind(SettingsScope::user(username).key())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn clear_all_settings(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM settings").execute(pool).await?;
    Ok(result.rows_affected())
}

async fn get_typed<T: DeserializeOwned>(
    pool: &SqlitePool,
    scope: &SettingsScope,
    key: &str,
) -> Result<Option<T>> {
    match get_setting(pool, scope, key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Store a value, or remove the key when there is none
async fn put_typed<T: Serialize>(
    pool: &SqlitePool,
    scope: &SettingsScope,
    key: &str,
    value: Option<&T>,
) -> Result<()> {
    match value {
        Some(value) => set_setting(pool, scope, key, &serde_json::to_value(value)?).await,
        None => delete_setting(pool, scope, key).await,
    }
}

/// Current theme, `light` when unset
pub async fn get_theme(pool: &SqlitePool) -> Result<Theme> {
    Ok(get_typed(pool, &SettingsScope::Global, SETTING_THEME)
        .await?
        .unwrap_or_default())
}

pub async fn set_theme(pool: &SqlitePool, theme: &Theme) -> Result<()> {
    put_typed(pool, &SettingsScope::Global, SETTING_THEME, Some(theme)).await
}

pub async fn get_company_info(pool: &SqlitePool, username: &str) -> Result<Option<CompanyInfo>> {
    get_typed(pool, &SettingsScope::user(username), SETTING_COMPANY_INFO).await
}

pub async fn set_company_info(
    pool: &SqlitePool,
    username: &str,
    info: Option<&CompanyInfo>,
) -> Result<()> {
    put_typed(
        pool,
        &SettingsScope::user(username),
        SETTING_COMPANY_INFO,
        info,
    )
    .await
}

pub async fn get_activation(pool: &SqlitePool, username: &str) -> Result<Option<Activation>> {
    get_typed(pool, &SettingsScope::user(username), SETTING_ACTIVATION).await
}

pub async fn set_activation(
    pool: &SqlitePool,
    username: &str,
    activation: Option<&Activation>,
) -> Result<()> {
    put_typed(
        pool,
        &SettingsScope::user(username),
        SETTING_ACTIVATION,
        activation,
    )
    .await
}

/// Custom categories, `None` when neither list was ever stored
pub async fn get_custom_categories(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<CustomCategories>> {
    let scope = SettingsScope::user(username);
    let work_orders: Option<Vec<String>> =
        get_typed(pool, &scope, SETTING_WORK_ORDER_CATEGORIES).await?;
    let expenses: Option<Vec<String>> = get_typed(pool, &scope, SETTING_EXPENSE_CATEGORIES).await?;

    if work_orders.is_none() && expenses.is_none() {
        return Ok(None);
    }

    Ok(Some(CustomCategories {
        work_orders: work_orders.unwrap_or_default(),
        expenses: expenses.unwrap_or_default(),
    }))
}

pub async fn set_custom_categories(
    pool: &SqlitePool,
    username: &str,
    categories: Option<&CustomCategories>,
) -> Result<()> {
    let scope = SettingsScope::user(username);
    let work_orders = categories.map(|c| &c.work_orders);
    put_typed(pool, &scope, SETTING_WORK_ORDER_CATEGORIES, work_orders).await?;
    let expenses = categories.map(|c| &c.expenses);
    put_typed(pool, &scope, SETTING_EXPENSE_CATEGORIES, expenses).await
}

/// Crash-recovery mirror of the last snapshot
pub async fn get_backup_mirror(pool: &SqlitePool, username: &str) -> Result<Option<Value>> {
    get_setting(pool, &SettingsScope::user(username), SETTING_BACKUP).await
}

pub async fn set_backup_mirror(pool: &SqlitePool, username: &str, snapshot: &Value) -> Result<()> {
    set_setting(pool, &SettingsScope::user(username), SETTING_BACKUP, snapshot).await
}

/// Everything a snapshot carries besides records
pub async fn load_bundle(pool: &SqlitePool, username: &str) -> Result<SettingsBundle> {
    Ok(SettingsBundle {
        theme: get_theme(pool).await?,
        company_info: get_company_info(pool, username).await?,
        activation: get_activation(pool, username).await?,
        categories: get_custom_categories(pool, username).await?,
    })
}

/// Write a bundle verbatim; keys absent from the bundle are removed
pub async fn save_bundle(pool: &SqlitePool, username: &str, bundle: &SettingsBundle) -> Result<()> {
    set_theme(pool, &bundle.theme).await?;
    set_company_info(pool, username, bundle.company_info.as_ref()).await?;
    set_activation(pool, username, bundle.activation.as_ref()).await?;
    set_custom_categories(pool, username, bundle.categories.as_ref()).await
}
