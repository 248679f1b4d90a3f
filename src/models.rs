//! Expense data model
//!
//! Records are created and deleted, never mutated in place. The wire format is
//! JSON with camelCase keys, as delivered by the managed backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single expense record.
///
/// `id` is assigned by the backend on creation. It is optional here because a
/// record can briefly exist on the client before the backend has assigned one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    /// Create a persisted record with a backend-assigned identifier
    pub fn new(id: impl Into<String>, name: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            amount,
            owner: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Create a record that has not been assigned an identifier yet
    pub fn pending(name: impl Into<String>, amount: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            amount,
            owner: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the owning user
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set creation and update timestamps
    pub fn timestamps(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self.updated_at = Some(at);
        self
    }
}

/// Field map sent to the backend when creating a record.
///
/// Both fields carry the raw form values; `amount` has been checked to be
/// numeric but is transmitted verbatim (`"4.50"` stays `"4.50"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub amount: String,
}

impl NewExpense {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }

    /// Numeric value of the amount, if it parses
    pub fn amount_value(&self) -> Option<f64> {
        self.amount.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// The complete result set of the live query at one point in time.
///
/// Each snapshot supersedes every earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<Expense>,
    /// Whether the backend has finished its initial sync
    #[serde(default)]
    pub is_synced: bool,
}

impl Snapshot {
    pub fn new(items: Vec<Expense>) -> Self {
        Self {
            items,
            is_synced: true,
        }
    }
}

/// Accept the amount either as a JSON number or as a numeric string.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
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
        Amount::Number(value) => Ok(value),
        Amount::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {:?}: {}", text, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_deserialize_camel_case() {
        let json = r#"{
            "id": "abc123",
            "name": "Coffee",
            "amount": 4.5,
            "owner": "alice",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        }"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.id.as_deref(), Some("abc123"));
        assert_eq!(expense.name, "Coffee");
        assert_eq!(expense.amount, 4.5);
        assert_eq!(expense.owner.as_deref(), Some("alice"));
        assert!(expense.created_at.is_some());
    }

    #[test]
    fn test_expense_amount_from_string() {
        let json = r#"{"id": "x", "name": "Lunch", "amount": "12.75"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.amount, 12.75);
    }

    #[test]
    fn test_expense_rejects_non_numeric_amount() {
        let json = r#"{"id": "x", "name": "Lunch", "amount": "a lot"}"#;
        assert!(serde_json::from_str::<Expense>(json).is_err());
    }

    #[test]
    fn test_expense_without_id() {
        let json = r#"{"name": "Pending", "amount": 1}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert!(expense.id.is_none());
    }

    #[test]
    fn test_new_expense_serializes_raw_fields() {
        let fields = NewExpense::new("Coffee", "4.50");
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Coffee", "amount": "4.50"}));
        assert_eq!(fields.amount_value(), Some(4.5));
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.is_synced);

        let snapshot: Snapshot =
            serde_json::from_str(r#"{"items": [{"id": "1", "name": "Tea", "amount": 2}], "isSynced": true}"#)
                .unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.is_synced);
    }
}
