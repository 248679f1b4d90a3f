//! UI Components

pub mod expense_form;
pub mod expense_list;
pub mod sign_in;
pub mod toast;

pub use expense_form::ExpenseForm;
pub use expense_list::ExpenseList;
pub use sign_in::SignIn;
pub use toast::Toast;
