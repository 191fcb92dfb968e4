/// Remote authority abstraction
///
/// The synchronization engine talks to the server only through this trait so
/// that it can run against the HTTP client, a mock server, or nothing at all.
use crate::error::Result;
use crate::types::{
    CategoriesDocument, CompanyInfo, RemoteUser, UserDataDocument, UserInfoDocument,
};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Create the account on the server
    ///
    /// # Errors
    /// `RemoteRejected` when the server refuses (e.g. duplicate username),
    /// `RemoteUnreachable` on transport failure
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<Value>;

    /// Check credentials against the server copy of the account
    async fn login(&self, username: &str, password: &str) -> Result<RemoteUser>;

    /// Store a named JSON document, replacing any previous version
    async fn save_document(&self, filename: &str, content: &Value) -> Result<()>;

    /// Fetch the info document
    ///
    /// Returns `Ok(None)` when the server has nothing for this user, and an
    /// error only when it could not be asked.
    async fn load_info(&self, username: &str) -> Result<Option<UserInfoDocument>>;

    /// Fetch the data document; `Ok(None)` when absent
    async fn load_data(&self, username: &str) -> Result<Option<UserDataDocument>>;

    /// Fetch the custom categories document; `Ok(None)` when absent
    async fn load_categories(&self, username: &str) -> Result<Option<CategoriesDocument>>;

    async fn update_company_info(&self, username: &str, info: &CompanyInfo) -> Result<()>;
}
