//! Main ledger sync server client.

use crate::auth::AuthClient;
use crate::documents::DocumentClient;
use crate::error::{Result, ServerClientError};
use crate::types::ServerConfig;
use async_trait::async_trait;
use ledger_core::types::{
    CategoriesDocument, CompanyInfo, RemoteUser, UserDataDocument, UserInfoDocument,
};
use ledger_core::RemoteAuthority;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Client for one sync server origin.
///
/// Stateless apart from the HTTP connection pool: every call carries what it
/// needs. Implements [`RemoteAuthority`] for the synchronization engine.
///
/// # Example
///
/// ```ignore
/// use ledger_server_client::{LedgerServerClient, ServerConfig};
///
/// let client = LedgerServerClient::new(ServerConfig::new("https://ledger.example.com"))?;
/// let user = client.auth().login("alice", "secret1").await?;
/// let info = client.load_info_document("alice").await?;
/// ```
pub struct LedgerServerClient {
    http: Client,
    base_url: String,
}

impl LedgerServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        // Validate URL
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let base_url = config.url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10).min(config.timeout))
            .user_agent(format!("Ledger/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Get the server URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Account endpoints.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.base_url)
    }

    /// Document endpoints.
    pub fn documents(&self) -> DocumentClient<'_> {
        DocumentClient::new(&self.http, &self.base_url)
    }

    /// `load_info`, falling back to the older `users` route
    pub async fn load_info_document(&self, username: &str) -> Result<Option<UserInfoDocument>> {
        self.documents().load(&["load_info", "users"], username).await
    }

    /// `load_data`, falling back to the older `user_data` route
    pub async fn load_data_document(&self, username: &str) -> Result<Option<UserDataDocument>> {
        self.documents().load(&["load_data", "user_data"], username).await
    }

    pub async fn load_categories_document(
        &self,
        username: &str,
    ) -> Result<Option<CategoriesDocument>> {
        self.documents().load(&["load_categories"], username).await
    }
}

/// Log at this layer; callers decide whether the failure matters
fn logged<T>(operation: &str, result: Result<T>) -> ledger_core::Result<T> {
    result.map_err(|e| {
        warn!(operation, error = %e, "Sync server call failed");
        e.into()
    })
}

#[async_trait]
impl RemoteAuthority for LedgerServerClient {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ledger_core::Result<Value> {
        logged("register", self.auth().register(username, email, password).await)
    }

    async fn login(&self, username: &str, password: &str) -> ledger_core::Result<RemoteUser> {
        logged("login", self.auth().login(username, password).await)
    }

    async fn save_document(&self, filename: &str, content: &Value) -> ledger_core::Result<()> {
        logged("save", self.documents().save(filename, content).await)
    }

    async fn load_info(&self, username: &str) -> ledger_core::Result<Option<UserInfoDocument>> {
        logged("load_info", self.load_info_document(username).await)
    }

    async fn load_data(&self, username: &str) -> ledger_core::Result<Option<UserDataDocument>> {
        logged("load_data", self.load_data_document(username).await)
    }

    async fn load_categories(
        &self,
        username: &str,
    ) -> ledger_core::Result<Option<CategoriesDocument>> {
        logged("load_categories", self.load_categories_document(username).await)
    }

    async fn update_company_info(
        &self,
        username: &str,
        info: &CompanyInfo,
    ) -> ledger_core::Result<()> {
        logged(
            "update_company_info",
            self.documents().update_company_info(username, info).await,
        )
    }
}
