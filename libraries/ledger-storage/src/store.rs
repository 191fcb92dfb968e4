//! Store handle shared by the engine and the backup service

use ledger_core::types::{
    Activation, Collection, CompanyInfo, CustomCategories, NewUser, OwnedRecord, RecordId,
    SettingsBundle, SnapshotStats, Theme, User,
};
use ledger_core::Result;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::context::UserContext;
use crate::error::StorageError;
use crate::{create_pool, records, run_migrations, settings, stats, users};

/// Durable local store backed by one SQLite database
///
/// Holds the connection pool and reopens it once if it was closed under it,
/// so a stale handle never surfaces as an error by itself.
pub struct LocalStore {
    database_url: String,
    pool: RwLock<SqlitePool>,
}

impl LocalStore {
    /// Open (or create) the database and bring its schema up to date
    ///
    /// Idempotent: opening an existing database keeps its data.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the database cannot be opened or migrated
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = Self::connect(database_url).await?;
        tracing::info!(url = %database_url, "Local store opened");

        Ok(Self {
            database_url: database_url.to_string(),
            pool: RwLock::new(pool),
        })
    }

    async fn connect(database_url: &str) -> std::result::Result<SqlitePool, StorageError> {
        let pool = create_pool(database_url)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    /// Connection pool, reopened first if it has been closed
    pub async fn pool(&self) -> Result<SqlitePool> {
        {
            let pool = self.pool.read().await;
            if !pool.is_closed() {
                return Ok(pool.clone());
            }
        }

        let mut pool = self.pool.write().await;
        if pool.is_closed() {
            tracing::warn!(url = %self.database_url, "Local store connection closed, reopening");
            *pool = Self::connect(&self.database_url).await?;
        }
        Ok(pool.clone())
    }

    /// Close every connection; the next operation reopens them
    pub async fn close(&self) {
        self.pool.read().await.close().await;
    }

    // Records

    pub async fn insert<T: OwnedRecord>(&self, ctx: &UserContext, record: T) -> Result<T> {
        Ok(records::insert(&self.pool().await?, ctx, record).await?)
    }

    pub async fn restore<T: OwnedRecord>(&self, ctx: &UserContext, record: T) -> Result<T> {
        Ok(records::restore(&self.pool().await?, ctx, record).await?)
    }

    pub async fn read_all<T: OwnedRecord>(&self, ctx: &UserContext) -> Result<Vec<T>> {
        Ok(records::read_all(&self.pool().await?, ctx).await?)
    }

    pub async fn read_all_any<T: OwnedRecord>(&self) -> Result<Vec<T>> {
        Ok(records::read_all_any(&self.pool().await?).await?)
    }

    pub async fn read_owned_by<T: OwnedRecord>(&self, owner: &str) -> Result<Vec<T>> {
        Ok(records::read_owned_by(&self.pool().await?, owner).await?)
    }

    pub async fn find_by_id<T: OwnedRecord>(
        &self,
        ctx: &UserContext,
        id: RecordId,
    ) -> Result<Option<T>> {
        Ok(records::find_by_id(&self.pool().await?, ctx, id).await?)
    }

    pub async fn find_by_category<T: OwnedRecord>(
        &self,
        ctx: &UserContext,
        category: &str,
    ) -> Result<Vec<T>> {
        Ok(records::find_by_category(&self.pool().await?, ctx, category).await?)
    }

    pub async fn find_in_date_range<T: OwnedRecord>(
        &self,
        ctx: &UserContext,
        from: &str,
        to: &str,
    ) -> Result<Vec<T>> {
        Ok(records::find_in_date_range(&self.pool().await?, ctx, from, to).await?)
    }

    pub async fn update<T: OwnedRecord>(&self, ctx: &UserContext, record: &T) -> Result<bool> {
        Ok(records::update(&self.pool().await?, ctx, record).await?)
    }

    pub async fn upsert<T: OwnedRecord>(&self, ctx: &UserContext, record: T) -> Result<T> {
        Ok(records::upsert(&self.pool().await?, ctx, record).await?)
    }

    pub async fn delete_owned<T: OwnedRecord>(
        &self,
        ctx: &UserContext,
        id: RecordId,
    ) -> Result<bool> {
        Ok(records::delete_owned::<T>(&self.pool().await?, ctx, id).await?)
    }

    pub async fn delete_any<T: OwnedRecord>(&self, id: RecordId) -> Result<bool> {
        Ok(records::delete_any::<T>(&self.pool().await?, id).await?)
    }

    pub async fn clear_owned<T: OwnedRecord>(&self, ctx: &UserContext) -> Result<u64> {
        Ok(records::clear_owned::<T>(&self.pool().await?, ctx).await?)
    }

    pub async fn clear_owned_by<T: OwnedRecord>(&self, owner: &str) -> Result<u64> {
        Ok(records::clear_owned_by::<T>(&self.pool().await?, owner).await?)
    }

    pub async fn count_owned_by<T: OwnedRecord>(&self, owner: &str) -> Result<i64> {
        Ok(records::count_owned_by::<T>(&self.pool().await?, owner).await?)
    }

    pub async fn id_exists<T: OwnedRecord>(&self, id: RecordId) -> Result<bool> {
        Ok(records::id_exists::<T>(&self.pool().await?, id).await?)
    }

    /// Empty one collection regardless of owner
    pub async fn clear_any(&self, collection: Collection) -> Result<u64> {
        let pool = self.pool().await?;
        let removed = match collection {
            Collection::WorkOrders => {
                records::clear_any::<ledger_core::WorkOrder>(&pool).await?
            }
            Collection::Expenses => records::clear_any::<ledger_core::Expense>(&pool).await?,
            Collection::Settings => settings::clear_all_settings(&pool).await?,
            Collection::Stats => stats::clear_all(&pool).await?,
            Collection::Users => sqlx::query("DELETE FROM users")
                .execute(&pool)
                .await?
                .rows_affected(),
        };

        tracing::info!(collection = %collection, removed, "Collection cleared");
        Ok(removed)
    }

    /// Empty every collection
    pub async fn clear_all(&self) -> Result<()> {
        for collection in Collection::ALL {
            self.clear_any(collection).await?;
        }
        Ok(())
    }

    // Users

    pub async fn insert_user(&self, user: NewUser) -> Result<User> {
        Ok(users::insert(&self.pool().await?, user).await?)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(users::find_by_username(&self.pool().await?, username).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(users::find_by_email(&self.pool().await?, email).await?)
    }

    pub async fn update_user(&self, user: &User) -> Result<bool> {
        Ok(users::update(&self.pool().await?, user).await?)
    }

    pub async fn touch_last_login(&self, username: &str) -> Result<()> {
        Ok(users::touch_last_login(&self.pool().await?, username).await?)
    }

    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        Ok(users::delete(&self.pool().await?, username).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(users::list(&self.pool().await?).await?)
    }

    // Settings

    pub async fn theme(&self) -> Result<Theme> {
        Ok(settings::get_theme(&self.pool().await?).await?)
    }

    pub async fn set_theme(&self, theme: &Theme) -> Result<()> {
        Ok(settings::set_theme(&self.pool().await?, theme).await?)
    }

    pub async fn company_info(&self, username: &str) -> Result<Option<CompanyInfo>> {
        Ok(settings::get_company_info(&self.pool().await?, username).await?)
    }

    pub async fn set_company_info(&self, username: &str, info: Option<&CompanyInfo>) -> Result<()> {
        Ok(settings::set_company_info(&self.pool().await?, username, info).await?)
    }

    pub async fn activation(&self, username: &str) -> Result<Option<Activation>> {
        Ok(settings::get_activation(&self.pool().await?, username).await?)
    }

    pub async fn set_activation(
        &self,
        username: &str,
        activation: Option<&Activation>,
    ) -> Result<()> {
        Ok(settings::set_activation(&self.pool().await?, username, activation).await?)
    }

    pub async fn custom_categories(&self, username: &str) -> Result<Option<CustomCategories>> {
        Ok(settings::get_custom_categories(&self.pool().await?, username).await?)
    }

    pub async fn set_custom_categories(
        &self,
        username: &str,
        categories: Option<&CustomCategories>,
    ) -> Result<()> {
        Ok(settings::set_custom_categories(&self.pool().await?, username, categories).await?)
    }

    pub async fn backup_mirror(&self, username: &str) -> Result<Option<Value>> {
        Ok(settings::get_backup_mirror(&self.pool().await?, username).await?)
    }

    pub async fn set_backup_mirror(&self, username: &str, snapshot: &Value) -> Result<()> {
        Ok(settings::set_backup_mirror(&self.pool().await?, username, snapshot).await?)
    }

    pub async fn load_settings(&self, username: &str) -> Result<SettingsBundle> {
        Ok(settings::load_bundle(&self.pool().await?, username).await?)
    }

    pub async fn save_settings(&self, username: &str, bundle: &SettingsBundle) -> Result<()> {
        Ok(settings::save_bundle(&self.pool().await?, username, bundle).await?)
    }

    pub async fn clear_user_settings(&self, username: &str) -> Result<u64> {
        Ok(settings::clear_user_settings(&self.pool().await?, username).await?)
    }

    // Stats

    pub async fn stats(&self, owner: &str) -> Result<Option<SnapshotStats>> {
        Ok(stats::get(&self.pool().await?, owner).await?)
    }

    pub async fn set_stats(&self, owner: &str, value: &SnapshotStats) -> Result<()> {
        Ok(stats::upsert(&self.pool().await?, owner, value).await?)
    }

    pub async fn delete_stats(&self, owner: &str) -> Result<()> {
        Ok(stats::delete(&self.pool().await?, owner).await?)
    }
}
