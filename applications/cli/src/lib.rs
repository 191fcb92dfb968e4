//! Ledger CLI Library
//!
//! Configuration loading and engine wiring for the `ledger` command-line
//! client. Exposed as a library for testing purposes.

pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::LedgerConfig;
pub use error::{CliError, Result};
