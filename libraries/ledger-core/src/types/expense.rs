/// Expense domain type
use super::record::{de_amount, default_category};
use crate::types::{Collection, OwnedRecord, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an expense was paid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    Transfer,
    #[serde(other)]
    Other,
}

/// A business expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(
        default,
        rename = "username",
        alias = "owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "de_amount")]
    pub amount: f64,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    /// Reference to a scanned receipt, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            owner: None,
            description: description.into(),
            amount,
            category: category.into(),
            date: date.into(),
            payment_method: PaymentMethod::Card,
            receipt: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }
}

impl OwnedRecord for Expense {
    const COLLECTION: Collection = Collection::Expenses;
    const LABEL_FIELD: &'static str = "description";

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    fn label(&self) -> &str {
        &self.description
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }
}
