//! Behaviour shared by the owner-scoped record types

use crate::error::{LedgerError, Result};
use crate::types::{Collection, RecordId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A record stored in one of the owner-scoped collections
///
/// The local store persists any `OwnedRecord` generically: the identifier and
/// owner live in their own columns, `date` and `category` are indexed, and the
/// full record is kept as a JSON body.
pub trait OwnedRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + Unpin + 'static
{
    /// Collection the record type lives in
    const COLLECTION: Collection;

    /// Name of the primary label field, used in validation messages
    const LABEL_FIELD: &'static str;

    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: Option<RecordId>);

    fn owner(&self) -> Option<&str>;

    fn set_owner(&mut self, owner: Option<String>);

    /// Primary label (designation for work orders, description for expenses)
    fn label(&self) -> &str;

    fn amount(&self) -> f64;

    fn category(&self) -> &str;

    fn date(&self) -> &str;

    /// Set `updatedAt`, and `createdAt` when it is still unset
    fn touch(&mut self, now: DateTime<Utc>);

    /// Check the fields required before a record may be persisted
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.label().trim().is_empty() {
            errors.push(format!("{} is required", Self::LABEL_FIELD));
        }

        let amount = self.amount();
        if !amount.is_finite() || amount <= 0.0 {
            errors.push("amount must be greater than 0".to_string());
        }

        if self.date().trim().is_empty() {
            errors.push("date is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::ValidationFailed(errors))
        }
    }

    /// Same record content, ignoring identifier and owner
    fn same_content(&self, other: &Self) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.set_id(None);
        a.set_owner(None);
        b.set_id(None);
        b.set_owner(None);
        a == b
    }
}

pub(crate) fn default_category() -> String {
    "Autre".to_string()
}

/// Amounts written by older clients are sometimes numeric strings
pub(crate) fn de_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(serde::de::Error::custom),
    }
}
