//! Backend API access

pub mod client;

pub use client::{create_expense, delete_expense, sign_in, sign_out, sign_up, Session};
