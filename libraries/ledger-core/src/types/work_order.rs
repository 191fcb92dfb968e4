/// Work order domain type
use super::record::{de_amount, default_category};
use crate::types::{Collection, OwnedRecord, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a work order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

/// A billable work order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    /// Store-assigned identifier, `None` until first insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Username owning the record
    #[serde(
        default,
        rename = "username",
        alias = "owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,

    #[serde(default)]
    pub designation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "de_amount")]
    pub amount: f64,

    #[serde(default = "default_category")]
    pub category: String,

    /// ISO instant or ISO date
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub status: WorkOrderStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    /// Create a pending work order with the required fields
    pub fn new(
        designation: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            owner: None,
            designation: designation.into(),
            description: None,
            amount,
            category: category.into(),
            date: date.into(),
            status: WorkOrderStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: WorkOrderStatus) -> Self {
        self.status = status;
        self
    }
}

impl OwnedRecord for WorkOrder {
    const COLLECTION: Collection = Collection::WorkOrders;
    const LABEL_FIELD: &'static str = "designation";

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
        &self.designation
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerError;

    #[test]
    fn test_valid_order() {
        let order = WorkOrder::new("Pump repair", 150.00, "Maintenance", "2024-03-01");
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_designation_and_zero_amount() {
        let order = WorkOrder::new("   ", 0.0, "Maintenance", "2024-03-01");

        match order.validate() {
            Err(LedgerError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("designation"));
                assert!(errors[1].contains("amount"));
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_negative_and_nan_amounts() {
        assert!(WorkOrder::new("A", -5.0, "X", "2024-03-01").validate().is_err());
        assert!(WorkOrder::new("A", f64::NAN, "X", "2024-03-01").validate().is_err());
    }

    #[test]
    fn test_wire_format_uses_username_for_owner() {
        let mut order = WorkOrder::new("Pump repair", 150.0, "Maintenance", "2024-03-01");
        order.owner = Some("alice".to_string());
        order.id = Some(7);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "pending");
        assert!(json.get("owner").is_none());
    }

    #[test]
    fn test_parses_legacy_client_record() {
        let json = serde_json::json!({
            "id": 3,
            "designation": "Boiler service",
            "amount": "89,50",
            "date": "2024-01-15T09:30:00.000Z",
            "username": "alice",
            "type": "orders",
            "createdAt": "2024-01-15T09:31:02.123Z"
        });

        let order: WorkOrder = serde_json::from_value(json).unwrap();
        assert_eq!(order.amount, 89.5);
        assert_eq!(order.category, "Autre");
        assert_eq!(order.owner.as_deref(), Some("alice"));
        assert!(order.created_at.is_some());
    }
}
