//! Ledger Core
//!
//! Platform-agnostic domain types, traits, and error handling for the
//! offline-first business ledger.
//!
//! This crate provides the building blocks shared by the local store, the
//! remote sync client and the synchronization engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `WorkOrder`, `Expense`, `User`, the settings bundle
//! - **Snapshots**: the portable per-user backup format (current and legacy)
//! - **Remote Documents**: the JSON documents exchanged with the server
//! - **Seam Traits**: `RemoteAuthority`, `CredentialVerifier`
//! - **Error Handling**: unified `LedgerError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use ledger_core::types::{WorkOrder, OwnedRecord};
//!
//! let order = WorkOrder::new("Pump repair", 150.00, "Maintenance", "2024-03-01");
//! assert!(order.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod remote;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::CredentialVerifier;
pub use error::{LedgerError, Result};
pub use remote::RemoteAuthority;

pub use types::{
    // Records
    Collection, Expense, OwnedRecord, PaymentMethod, RecordId, WorkOrder, WorkOrderStatus,
    // Users
    NewUser, User, UserId,
    // Settings
    Activation, CompanyInfo, CustomCategories, SettingsBundle, Theme,
    // Snapshots
    LegacySnapshot, Snapshot, SnapshotData, SnapshotFormat, SnapshotStats, SnapshotUser,
};
