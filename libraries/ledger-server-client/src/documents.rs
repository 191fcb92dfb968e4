//! Document storage endpoints of the sync server.

use crate::auth::error_message;
use crate::error::{Result, ServerClientError};
use crate::types::{CompanyInfoRequest, SaveRequest};
use ledger_core::types::CompanyInfo;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Document client for the sync server.
pub struct DocumentClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

/// Pick the user's entry out of a loader payload
///
/// Servers answer either with the document itself or with an array of
/// documents for every user. An `{error}` object means "nothing stored".
fn select_entry(payload: Value, username: &str) -> Option<Value> {
    let mut entry = match payload {
        Value::Array(entries) => entries
            .into_iter()
            .find(|e| e.get("username").and_then(Value::as_str) == Some(username))?,
        Value::Object(map) => {
            if map.contains_key("error") {
                return None;
            }
            Value::Object(map)
        }
        _ => return None,
    };

    if let Value::Object(map) = &mut entry {
        map.entry("username")
            .or_insert_with(|| Value::String(username.to_string()));
    }
    Some(entry)
}

/// `{base}/api/{route}/{username}` with the username as one escaped segment
fn user_url(base_url: &str, route: &str, username: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ServerClientError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(["api", route, username]);
    Ok(url)
}

impl<'a> DocumentClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Store a named document, replacing any previous version.
    pub async fn save(&self, filename: &str, content: &Value) -> Result<()> {
        let url = format!("{}/api/save", self.base_url);
        debug!(url = %url, filename = %filename, "Saving document");

        let response = self
            .http
            .post(&url)
            .json(&SaveRequest { filename, content })
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            debug!(filename = %filename, "Document saved");
            Ok(())
        } else {
            let message = error_message(response).await;
            warn!(
                status = %status,
                filename = %filename,
                error = %message,
                "Document save refused"
            );
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Load a user's document, trying each `/api/{route}/{username}` in turn.
    ///
    /// A route answering with a non-success status moves on to the next one.
    /// Returns `Ok(None)` when no route has a document for the user.
    pub async fn load<T: DeserializeOwned>(
        &self,
        routes: &[&str],
        username: &str,
    ) -> Result<Option<T>> {
        for route in routes {
            let url = user_url(self.base_url, route, username)?;
            debug!(url = %url, "Loading document");

            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(ServerClientError::from_transport)?;

            if !response.status().is_success() {
                debug!(url = %url, status = %response.status(), "No document at path");
                continue;
            }

            let payload: Value = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse document: {}", e))
            })?;

            let Some(entry) = select_entry(payload, username) else {
                debug!(username = %username, "Payload holds no entry for user");
                return Ok(None);
            };

            let document = serde_json::from_value(entry).map_err(|e| {
                ServerClientError::ParseError(format!("Unexpected document shape: {}", e))
            })?;
            return Ok(Some(document));
        }

        Ok(None)
    }

    pub async fn update_company_info(&self, username: &str, info: &CompanyInfo) -> Result<()> {
        let url = format!("{}/api/update_company_info", self.base_url);
        debug!(url = %url, username = %username, "Updating company info");

        let response = self
            .http
            .post(&url)
            .json(&CompanyInfoRequest {
                username,
                company_info: info,
            })
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = error_message(response).await;
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }
}
