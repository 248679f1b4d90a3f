//! Renderable page model
//!
//! Pure data describing what the user sees. Front ends (the console page,
//! the browser UI) turn a [`Page`] into their own widgets.

use std::collections::HashSet;

use crate::models::Expense;

use super::form::ExpenseForm;

pub const TITLE: &str = "Expense Tracker";
pub const LIST_HEADING: &str = "Expenses";
pub const SIGN_OUT_LABEL: &str = "Sign Out";
pub const CREATE_LABEL: &str = "Create Expense";
pub const DELETE_LABEL: &str = "Delete note";

/// What the user currently sees
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// Unauthenticated: only the sign-in prompt
    SignIn(SignInView),
    /// Authenticated: form, list and sign-out control
    Tracker(TrackerView),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInView {
    /// Reason the last sign-in attempt failed
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerView {
    pub username: String,
    pub form: ExpenseForm,
    pub cards: Vec<Card>,
    pub is_synced: bool,
    pub notice: Option<Notice>,
}

/// Transient message shown above the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Error(message) => message,
        }
    }
}

/// One rendered expense
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Unique among the cards of one render
    pub key: String,
    pub id: Option<String>,
    pub name: String,
    /// Amount with a `$` prefix, e.g. `$4.5`
    pub amount: String,
}

impl Card {
    /// A record that has not been assigned an identifier cannot be deleted
    pub fn can_delete(&self) -> bool {
        self.id.is_some()
    }
}

impl Page {
    pub fn title(&self) -> &'static str {
        TITLE
    }

    pub fn shows_form(&self) -> bool {
        matches!(self, Page::Tracker(_))
    }

    pub fn shows_list(&self) -> bool {
        matches!(self, Page::Tracker(_))
    }

    pub fn shows_sign_out(&self) -> bool {
        matches!(self, Page::Tracker(_))
    }

    pub fn tracker(&self) -> Option<&TrackerView> {
        match self {
            Page::Tracker(view) => Some(view),
            Page::SignIn(_) => None,
        }
    }
}

/// Format an amount for display
pub fn format_amount(amount: f64) -> String {
    format!("${}", amount)
}

/// Render one card per expense, preserving order.
///
/// Keys come from the record id, falling back to the name. A key already
/// used earlier in the list gets a `#<n>` suffix, starting at its position
/// and counting up until the key is unused.
pub fn render_cards(expenses: &[Expense]) -> Vec<Card> {
    let mut seen = HashSet::with_capacity(expenses.len());

    expenses
        .iter()
        .enumerate()
        .map(|(position, expense)| {
            let base = expense.id.clone().unwrap_or_else(|| expense.name.clone());
            let key = unique_key(&seen, base, position);
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

fn unique_key(seen: &HashSet<String>, base: String, position: usize) -> String {
    if !seen.contains(&base) {
        return base;
    }

    let mut suffix = position;
    loop {
        let candidate = format!("{}#{}", base, suffix);
        if !seen.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
