//! JSON documents exchanged with the remote authority
//!
//! The server stores opaque files by name. Each user owns up to four of them:
//! an info document (account, activation, settings), a data document
//! (records and stats), dated backup copies of the data document, and a
//! custom categories document.

use crate::types::{
    Activation, CompanyInfo, CustomCategories, Snapshot, SnapshotData, SnapshotStats, Theme,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const USER_DATA_TYPE: &str = "user_data";

fn user_data_type() -> String {
    USER_DATA_TYPE.to_string()
}

pub fn info_filename(username: &str) -> String {
    format!("user_info_{username}.json")
}

pub fn data_filename(username: &str) -> String {
    format!("user_data_{username}.json")
}

/// Dated copy of the data document pushed by a complete restore
pub fn backup_filename(username: &str, date: NaiveDate) -> String {
    format!("user_data_{username}_backup_{}.json", date.format("%Y-%m-%d"))
}

pub fn categories_filename(username: &str) -> String {
    format!("user_categories_{username}.json")
}

/// Settings carried by the info document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoSettings {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub company_info: Option<CompanyInfo>,
}

/// `user_info_<username>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDocument {
    pub username: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, rename = "userUniqueId", alias = "uniqueDeviceId")]
    pub unique_device_id: Option<String>,

    #[serde(default)]
    pub activation: Option<Activation>,

    #[serde(default)]
    pub settings: UserInfoSettings,

    /// Older servers kept the company profile at the top level
    #[serde(default, skip_serializing)]
    pub company_info: Option<CompanyInfo>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl UserInfoDocument {
    pub fn from_snapshot(username: &str, snapshot: &Snapshot) -> Self {
        let user = snapshot.user.as_ref();
        let activation = snapshot.settings.activation.as_ref().map(|a| Activation {
            // The email and device id are carried at the top level of the document
            email: None,
            username: None,
            unique_device_id: None,
            ..a.clone()
        });

        Self {
            username: username.to_string(),
            email: user.and_then(|u| u.email.clone()),
            unique_device_id: user.and_then(|u| u.unique_device_id.clone()),
            activation,
            settings: UserInfoSettings {
                theme: Some(snapshot.settings.theme.clone()),
                company_info: snapshot.settings.company_info.clone(),
            },
            company_info: None,
            created_at: user.and_then(|u| u.created_at),
            last_login: user.and_then(|u| u.last_login),
            saved_at: Some(Utc::now()),
        }
    }

    /// Company profile, preferring the nested settings entry
    pub fn company_info(&self) -> Option<&CompanyInfo> {
        self.settings
            .company_info
            .as_ref()
            .or(self.company_info.as_ref())
    }
}

/// `user_data_<username>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataDocument {
    pub username: String,

    #[serde(rename = "type", default = "user_data_type")]
    pub doc_type: String,

    #[serde(default)]
    pub data: SnapshotData,

    #[serde(default)]
    pub stats: SnapshotStats,

    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl UserDataDocument {
    pub fn from_snapshot(username: &str, snapshot: &Snapshot) -> Self {
        Self {
            username: username.to_string(),
            doc_type: user_data_type(),
            data: snapshot.data.clone(),
            stats: snapshot.stats.clone(),
            saved_at: Some(Utc::now()),
        }
    }
}

/// `user_categories_<username>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesDocument {
    pub username: String,

    #[serde(flatten)]
    pub categories: CustomCategories,

    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CategoriesDocument {
    pub fn new(username: &str, categories: CustomCategories) -> Self {
        Self {
            username: username.to_string(),
            categories,
            saved_at: Some(Utc::now()),
        }
    }
}

/// Account record returned by the server on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUser {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "userUniqueId")]
    pub unique_device_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
