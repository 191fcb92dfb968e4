//! Ledger Server Client
//!
//! HTTP client for the ledger sync server.
//!
//! # Features
//!
//! - **Accounts**: register and log in against the server copy of a user
//! - **Documents**: save named JSON documents, load a user's info, data and
//!   custom categories documents (with fallback to older routes)
//!
//! Loaders distinguish "the server has nothing" (`Ok(None)`) from "the server
//! could not be asked" (`Err`), so callers can tell an empty remote from an
//! unreachable one.
//!
//! # Example
//!
//! ```ignore
//! use ledger_server_client::{LedgerServerClient, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LedgerServerClient::new(ServerConfig::new("https://ledger.example.com"))?;
//!
//!     match client.load_data_document("alice").await? {
//!         Some(doc) => println!("{} work orders on server", doc.data.orders.len()),
//!         None => println!("No remote backup"),
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod documents;
mod error;
mod types;

// Re-export main types
pub use client::LedgerServerClient;
pub use error::{Result, ServerClientError};
pub use types::{LoginResponse, ServerConfig, DEFAULT_TIMEOUT};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use documents::DocumentClient;
