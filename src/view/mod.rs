//! Expense Tracker View
//!
//! Front-end independent model of the single tracker page.
//!
//! ## Layout
//!
//! - Signed out: a sign-in prompt and nothing else
//! - Signed in: the "Expense Tracker" title, a two-field form, the
//!   "Expenses" list of cards and a sign-out control
//!
//! The console front end and the browser UI both render from [`Page`].

mod controller;
mod form;
mod list;
mod page;

pub use controller::{ExpenseApp, ViewError};
pub use form::{ExpenseForm, FormError};
pub use list::ExpenseList;
pub use page::{
    format_amount, render_cards, Card, Notice, Page, SignInView, TrackerView, CREATE_LABEL,
    DELETE_LABEL, LIST_HEADING, SIGN_OUT_LABEL, TITLE,
};
