//! Account endpoints of the sync server.

use crate::error::{Result, ServerClientError};
use crate::types::{ErrorResponse, LoginRequest, LoginResponse, RegisterRequest};
use ledger_core::types::RemoteUser;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Authentication client for the sync server.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

/// Prefer the server's `{error}` message over the raw body
pub(crate) async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text)
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Create the account on the server.
    ///
    /// Returns the server's answer as-is on success.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Value> {
        let url = format!("{}/api/register", self.base_url);
        debug!(url = %url, username = %username, "Registering on server");

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        let status = response.status();

        if status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            info!(username = %username, "Registered on server");
            Ok(body)
        } else {
            let message = error_message(response).await;
            warn!(status = %status, error = %message, "Server registration refused");
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Check credentials against the server.
    ///
    /// Returns the server's user record on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<RemoteUser> {
        let url = format!("{}/api/login", self.base_url);
        debug!(url = %url, username = %username, "Attempting login");

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        let status = response.status();

        if status.is_success() {
            let login_response: LoginResponse = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse login response: {}", e))
            })?;
            let user = login_response.into_user();

            info!(username = %user.username, "Server login successful");
            Ok(user)
        } else if status.as_u16() == 401 {
            let message = error_message(response).await;
            warn!(status = %status, error = %message, "Login failed: invalid credentials");
            Err(ServerClientError::AuthFailed(username.to_string()))
        } else {
            let message = error_message(response).await;
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }
}
