/// User domain type
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned row identifier
    pub id: UserId,

    /// Unique login name, also the owner key of every record
    pub username: String,

    pub email: String,

    /// Opaque credential produced by a `CredentialVerifier`
    #[serde(default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tutorial_seen: bool,

    /// Random per-user identifier generated at creation
    #[serde(default, alias = "userUniqueId")]
    pub unique_device_id: Option<String>,

    /// Materialized from a remote pull without a verified local password
    #[serde(default)]
    pub imported: bool,
}

impl User {
    /// Credential checks are skipped until a local password is set
    pub fn requires_password(&self) -> bool {
        !self.imported && !self.password_hash.is_empty()
    }
}

/// Fields needed to create a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub tutorial_seen: bool,
    pub unique_device_id: Option<String>,
    pub imported: bool,
}

impl NewUser {
    /// A locally registered user with a fresh unique identifier
    pub fn local(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            last_login: Some(now),
            tutorial_seen: false,
            unique_device_id: Some(uuid::Uuid::new_v4().to_string().to_uppercase()),
            imported: false,
        }
    }
}
