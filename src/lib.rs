//! # Tally
//!
//! A login-gated expense tracker client for a managed cloud backend.
//!
//! ## Features
//!
//! - **Authentication gate**: nothing but the sign-in prompt until a user
//!   pool session exists
//! - **Live list**: the expense list mirrors the backend's live query,
//!   replaced wholesale on every snapshot
//! - **Create and delete**: mutations go to the backend and show up through
//!   the next snapshot
//! - **Offline mode**: in-memory backend and authenticator for tests and demos
//!
//! ## Modules
//!
//! - [`bootstrap`]: Loads the backend outputs document and configures the client once
//! - [`auth`]: Sign-up, sign-in, sign-out and the shared session
//! - [`backend`]: Live query, create and delete over the expense collection
//! - [`view`]: Front-end independent page model and controller
//! - [`console`]: Terminal front end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tally::auth::{Credentials, LocalAuthenticator};
//! use tally::backend::MemoryBackend;
//! use tally::view::{ExpenseApp, ExpenseForm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tally = tally::bootstrap::offline(MemoryBackend::new(), LocalAuthenticator::accept_any());
//!     let app = ExpenseApp::new(&tally);
//!
//!     app.sign_in(Credentials::new("demo", "demo")).await?;
//!     app.set_form(ExpenseForm::new("Coffee", "4.50")).await;
//!     app.submit().await?.await?;
//!
//!     println!("{:?}", app.page().await);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod console;
pub mod logging;
pub mod models;
pub mod view;

// Re-export top-level types for convenience
pub use models::{Expense, NewExpense, Snapshot};

pub use auth::{
    AuthEndpoints, AuthError, Authenticator, Credentials, LocalAuthenticator,
    RemoteAuthenticator, Session, SessionStore,
};

pub use backend::{
    BackendError, BackendResult, DataEndpoints, ExpenseBackend, MemoryBackend, RemoteBackend,
    Subscription,
};

pub use bootstrap::{
    configure, configure_from_path, AuthMode, BackendOutputs, BootstrapError, OutputsError, Tally,
};

pub use view::{Card, ExpenseApp, ExpenseForm, FormError, Page, ViewError};

pub use config::{Config, ConfigError, LogFormat, LoggingConfig};
