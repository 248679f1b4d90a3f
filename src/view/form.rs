//! Expense creation form

use thiserror::Error;

use crate::models::NewExpense;

/// Why a form submission was refused before reaching the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Expense name is required")]
    MissingName,

    #[error("Expense amount is required")]
    MissingAmount,

    #[error("Expense amount must be a number: {0}")]
    InvalidAmount(String),
}

/// The two-field form: name and amount, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub name: String,
    pub amount: String,
}

impl ExpenseForm {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }

    /// Check both fields and build the create request from them
    pub fn to_request(&self) -> Result<NewExpense, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(FormError::MissingAmount);
        }

        match amount.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(NewExpense::new(name, amount)),
            _ => Err(FormError::InvalidAmount(amount.to_string())),
        }
    }

    /// Clear both fields
    pub fn reset(&mut self) {
        self.name.clear();
        self.amount.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.amount.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form_builds_request_verbatim() {
        let form = ExpenseForm::new("Coffee", "4.50");
        assert_eq!(form.to_request(), Ok(NewExpense::new("Coffee", "4.50")));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let form = ExpenseForm::new("  Coffee ", " 4.50 ");
        assert_eq!(form.to_request(), Ok(NewExpense::new("Coffee", "4.50")));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            ExpenseForm::new("", "4.50").to_request(),
            Err(FormError::MissingName)
        );
        assert_eq!(
            ExpenseForm::new("   ", "4.50").to_request(),
            Err(FormError::MissingName)
        );
        assert_eq!(
            ExpenseForm::new("Coffee", "").to_request(),
            Err(FormError::MissingAmount)
        );
    }

    #[test]
    fn test_amount_must_be_numeric() {
        assert_eq!(
            ExpenseForm::new("Coffee", "four").to_request(),
            Err(FormError::InvalidAmount("four".to_string()))
        );
        assert!(matches!(
            ExpenseForm::new("Coffee", "NaN").to_request(),
            Err(FormError::InvalidAmount(_))
        ));
        assert!(matches!(
            ExpenseForm::new("Coffee", "inf").to_request(),
            Err(FormError::InvalidAmount(_))
        ));
        assert!(ExpenseForm::new("Refund", "-3").to_request().is_ok());
    }

    #[test]
    fn test_reset() {
        let mut form = ExpenseForm::new("Coffee", "4.50");
        form.reset();
        assert!(form.is_empty());
        assert_eq!(form, ExpenseForm::default());
    }
}
