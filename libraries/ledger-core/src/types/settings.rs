//! Per-user settings bundle
//!
//! These are scoped key-value blobs kept outside the record collections. The
//! theme is the one global setting; everything else is stored per username.

use serde::{Deserialize, Serialize};

/// UI theme name (e.g. "light", "dark")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(String);

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self("light".to_string())
    }
}

/// Company profile printed on reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Company registration number
    #[serde(default)]
    pub siret: String,
    /// VAT number
    #[serde(default)]
    pub tva: String,
}

/// License activation record
///
/// Key derivation and validation happen elsewhere; this crate only carries
/// the record and answers the "is pro" question for a username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub activated_at: Option<String>,
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "userUniqueId", skip_serializing_if = "Option::is_none")]
    pub unique_device_id: Option<String>,
}

impl Activation {
    /// Pro features are granted only to the username the activation belongs to
    pub fn grants_pro(&self, username: &str) -> bool {
        self.is_pro && self.username.as_deref() == Some(username)
    }

    /// Copy of the record stamped with its owner
    pub fn for_user(&self, username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..self.clone()
        }
    }
}

/// User-defined categories, in addition to the built-in ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategories {
    #[serde(default, rename = "otCategories", alias = "workOrders")]
    pub work_orders: Vec<String>,
    #[serde(default, rename = "expenseCategories", alias = "expenses")]
    pub expenses: Vec<String>,
}

/// Everything a snapshot carries besides records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBundle {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub company_info: Option<CompanyInfo>,
    #[serde(default)]
    pub activation: Option<Activation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CustomCategories>,
}
