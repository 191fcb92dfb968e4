//! Ledger Storage
//!
//! Durable `SQLite` store for the offline-first ledger.
//!
//! # Architecture
//!
//! - **Owner-scoped**: work orders and expenses carry an owner and scoped
//!   reads only return the current user's rows
//! - **Vertical Slicing**: each collection owns its own queries
//! - **Schema versions**: embedded migrations bring any existing database up
//!   to date without touching its data
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_core::WorkOrder;
//! use ledger_storage::{LocalStore, UserContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalStore::open("sqlite://ledger.db").await?;
//! let ctx = UserContext::for_user("alice");
//!
//! let order = store
//!     .insert(&ctx, WorkOrder::new("Pump repair", 150.0, "Maintenance", "2024-03-01"))
//!     .await?;
//! assert_eq!(order.owner.as_deref(), Some("alice"));
//!
//! let orders: Vec<WorkOrder> = store.read_all(&ctx).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod store;

// Vertical slices
pub mod records;
pub mod settings;
pub mod stats;
pub mod users;

pub use context::UserContext;
pub use error::StorageError;
pub use store::LocalStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Safe to call on every start; applied versions are skipped.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://ledger.db`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
