//! Expense Data Model
//!
//! Wire types shared with the backend plus the pure rendering and validation
//! rules the components use.

use serde::Deserialize;
use std::collections::HashSet;

/// One persisted expense record
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Full result set pushed by the live query
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<Expense>,
    #[serde(default)]
    pub is_synced: bool,
}

/// Create request body; values are sent as typed
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct NewExpense {
    pub name: String,
    pub amount: String,
}

/// Amounts arrive as numbers, or as numeric strings from older clients
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value),
        Amount::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// A rendered expense
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub key: String,
    pub id: Option<String>,
    pub name: String,
    pub amount: String,
}

pub fn format_amount(amount: f64) -> String {
    format!("${}", amount)
}

/// One card per expense in list order, each with a key unique in the list
pub fn render_cards(expenses: &[Expense]) -> Vec<Card> {
    let mut seen = HashSet::with_capacity(expenses.len());

    expenses
        .iter()
        .enumerate()
        .map(|(position, expense)| {
            let base = expense.id.clone().unwrap_or_else(|| expense.name.clone());
            let mut key = base.clone();
            let mut suffix = position;
            while seen.contains(&key) {
                key = format!("{}#{}", base, suffix);
                suffix += 1;
            }
            seen.insert(key.clone());

            Card {
                key,
                id: expense.id.clone(),
                name: expense.name.clone(),
                amount: format_amount(expense.amount),
            }
        })
        .collect()
}

/// Check the form fields and build the create request
pub fn validate_form(name: &str, amount: &str) -> Result<NewExpense, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Expense name is required".to_string());
    }

    let amount = amount.trim();
    if amount.is_empty() {
        return Err("Expense amount is required".to_string());
    }

    match amount.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(NewExpense {
            name: name.to_string(),
            amount: amount.to_string(),
        }),
        _ => Err(format!("Expense amount must be a number: {}", amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_parsing() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"items":[{"id":"1","name":"Tea","amount":2},{"name":"Coffee","amount":"4.50"}],"isSynced":true}"#,
        )
        .unwrap();

        assert!(snapshot.is_synced);
        assert_eq!(snapshot.items[1].amount, 4.5);
        assert_eq!(snapshot.items[1].id, None);
    }

    #[test]
    fn test_cards_have_unique_keys() {
        let expenses = vec![
            Expense { id: None, name: "Coffee".into(), amount: 4.5, owner: None },
            Expense { id: None, name: "Coffee".into(), amount: 4.5, owner: None },
            Expense { id: Some("a".into()), name: "Tea".into(), amount: 2.0, owner: None },
        ];
        let cards = render_cards(&expenses);

        assert_eq!(cards[0].key, "Coffee");
        assert_eq!(cards[1].key, "Coffee#1");
        assert_eq!(cards[2].key, "a");
        assert_eq!(cards[0].amount, "$4.5");
        assert_eq!(cards[2].amount, "$2");
    }

    #[test]
    fn test_suffixed_key_skips_taken_names() {
        let pending = |name: &str| Expense { id: None, name: name.into(), amount: 1.0, owner: None };
        let cards = render_cards(&[pending("Coffee#2"), pending("Coffee"), pending("Coffee")]);

        let keys: HashSet<_> = cards.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(cards[2].key, "Coffee#3");
    }

    #[test]
    fn test_validate_form() {
        assert_eq!(
            validate_form(" Coffee ", "4.50"),
            Ok(NewExpense { name: "Coffee".into(), amount: "4.50".into() })
        );
        assert!(validate_form("", "4.50").is_err());
        assert!(validate_form("Coffee", " ").is_err());
        assert!(validate_form("Coffee", "abc").is_err());
    }
}
