//! In-process authenticator
//!
//! Stands in for the user pool in tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::{AuthError, Authenticator, Credentials, Session};

/// Authenticator backed by a user table.
///
/// Clones share the table, so an account signed up through one clone can
/// sign in through another.
#[derive(Debug, Clone, Default)]
pub struct LocalAuthenticator {
    /// Only users in the table may sign in. When unset any non-empty
    /// credentials are accepted.
    restricted: bool,
    users: Arc<RwLock<HashMap<String, String>>>,
}

impl LocalAuthenticator {
    /// Accept any non-empty username and password
    pub fn accept_any() -> Self {
        Self::default()
    }

    /// Accept only users added with [`LocalAuthenticator::with_user`] or
    /// signed up later
    pub fn new() -> Self {
        Self {
            restricted: true,
            users: Arc::default(),
        }
    }

    pub fn with_user(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.write_users().insert(username.into(), password.into());
        Self {
            restricted: true,
            ..self
        }
    }

    fn read_users(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        match self.users.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_users(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        match self.users.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn require_both(credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn sign_up(&self, credentials: Credentials) -> Result<(), AuthError> {
        require_both(&credentials)?;

        let mut users = self.write_users();
        if users.contains_key(&credentials.username) {
            return Err(AuthError::UsernameTaken);
        }
        tracing::debug!(username = %credentials.username, "Local sign-up");
        users.insert(credentials.username, credentials.password);
        Ok(())
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        require_both(&credentials)?;

        if self.restricted {
            match self.read_users().get(&credentials.username) {
                Some(password) if *password == credentials.password => {}
                _ => return Err(AuthError::InvalidCredentials),
            }
        }

        tracing::debug!(username = %credentials.username, "Local sign-in");
        Ok(Session::new(credentials.username, Uuid::new_v4().to_string()))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        if session.access_token.is_empty() {
            return Err(AuthError::NotSignedIn);
        }
        tracing::debug!(username = %session.username, "Local sign-out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_any() {
        let auth = LocalAuthenticator::accept_any();
        let session = auth.sign_in(Credentials::new("demo", "x")).await.unwrap();
        assert_eq!(session.username, "demo");
        assert!(!session.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_credentials() {
        let auth = LocalAuthenticator::accept_any();
        let result = auth.sign_in(Credentials::new("", "")).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));

        let result = auth.sign_up(Credentials::new("bob", "")).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_user_table() {
        let auth = LocalAuthenticator::new().with_user("alice", "secret");

        assert!(auth.sign_in(Credentials::new("alice", "secret")).await.is_ok());
        assert!(matches!(
            auth.sign_in(Credentials::new("alice", "wrong")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in(Credentials::new("mallory", "secret")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = LocalAuthenticator::new();
        let shared = auth.clone();

        assert!(matches!(
            auth.sign_in(Credentials::new("bob", "pw")).await,
            Err(AuthError::InvalidCredentials)
        ));

        auth.sign_up(Credentials::new("bob", "pw")).await.unwrap();
        let session = shared.sign_in(Credentials::new("bob", "pw")).await.unwrap();
        assert_eq!(session.username, "bob");

        assert!(matches!(
            auth.sign_up(Credentials::new("bob", "other")).await,
            Err(AuthError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_without_token() {
        let auth = LocalAuthenticator::accept_any();
        let result = auth.sign_out(&Session::new("alice", "")).await;
        assert!(matches!(result, Err(AuthError::NotSignedIn)));

        let session = auth.sign_in(Credentials::new("alice", "x")).await.unwrap();
        assert!(auth.sign_out(&session).await.is_ok());
    }
}
