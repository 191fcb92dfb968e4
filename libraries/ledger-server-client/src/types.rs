//! Types for the sync server API requests and responses.

use ledger_core::types::{CompanyInfo, RemoteUser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to a sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://ledger.example.com")
    pub url: String,
    /// Total request timeout
    pub timeout: Duration,
}

impl ServerConfig {
    /// Create a new server config with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Auth Types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login answer; older servers return the user record at the top level
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Wrapped { user: RemoteUser },
    Bare(RemoteUser),
}

impl LoginResponse {
    pub fn into_user(self) -> RemoteUser {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

/// `{error}` payload returned on failures
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Document Types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest<'a> {
    pub filename: &'a str,
    pub content: &'a Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfoRequest<'a> {
    pub username: &'a str,
    pub company_info: &'a CompanyInfo,
}
