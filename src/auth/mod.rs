//! Authentication
//!
//! Identity verification and session management belong to the managed
//! backend's user pool. This module only holds the resulting session and the
//! contract for obtaining and ending one.

mod local;
mod remote;

pub use local::LocalAuthenticator;
pub use remote::{AuthEndpoints, RemoteAuthenticator};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Username and password as typed by the user
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An established user session
#[derive(Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(username: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Whether the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Shared slot holding the current session.
///
/// The authenticated data client reads its bearer token from here, so
/// signing in or out takes effect on the next request.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, if one is established and not expired
    pub fn current(&self) -> Option<Session> {
        let session = match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        session.filter(|s| !s.is_expired(Utc::now()))
    }

    /// Bearer token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn set(&self, session: Session) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(session),
            Err(poisoned) => *poisoned.into_inner() = Some(session),
        }
    }

    /// Remove the session, returning it
    pub fn clear(&self) -> Option<Session> {
        match self.inner.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }
}

/// External authentication capability (the user pool)
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Register a new account. Does not sign in.
    async fn sign_up(&self, credentials: Credentials) -> Result<(), AuthError>;

    /// Verify credentials and establish a session
    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError>;

    /// End a session on the identity provider side. A session without a
    /// token was never established and yields [`AuthError::NotSignedIn`].
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;
}

/// Errors reported by the authenticator
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Authentication service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Authentication error {status}: {message}")]
    Api { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session::new("alice", "token").expires_at(now + Duration::minutes(5));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::minutes(6)));
        assert!(!Session::new("bob", "token").is_expired(now));
    }

    #[test]
    fn test_session_store_set_and_clear() {
        let store = SessionStore::new();
        assert!(!store.is_signed_in());

        store.set(Session::new("alice", "token-1"));
        assert!(store.is_signed_in());
        assert_eq!(store.access_token().as_deref(), Some("token-1"));

        let shared = store.clone();
        let cleared = shared.clear().unwrap();
        assert_eq!(cleared.username, "alice");
        assert!(!store.is_signed_in());
    }

    #[test]
    fn test_session_store_hides_expired_session() {
        let store = SessionStore::new();
        store.set(Session::new("alice", "old").expires_at(Utc::now() - Duration::seconds(1)));
        assert!(store.current().is_none());
        assert!(store.access_token().is_none());
    }
}
