//! User pool REST client
//!
//! Signs users up, in and out against the managed backend's user pool.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AuthError, Authenticator, Credentials, Session};

/// Where and how to reach the user pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Base URL of the user pool API, without trailing slash
    pub endpoint: String,
    pub user_pool_id: String,
    pub client_id: String,
}

/// User pool authenticator
pub struct RemoteAuthenticator {
    client: Client,
    endpoints: AuthEndpoints,
}

impl RemoteAuthenticator {
    pub fn new(endpoints: AuthEndpoints, timeout: std::time::Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.endpoint, path)
    }

    fn credentials_body<'a>(&'a self, credentials: &'a Credentials) -> CredentialsRequest<'a> {
        CredentialsRequest {
            username: &credentials.username,
            password: &credentials.password,
            user_pool_id: &self.endpoints.user_pool_id,
            client_id: &self.endpoints.client_id,
        }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn sign_up(&self, credentials: Credentials) -> Result<(), AuthError> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self
            .client
            .post(self.url("sign-up"))
            .json(&self.credentials_body(&credentials))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(username = %credentials.username, "User pool sign-up succeeded");
                Ok(())
            }
            StatusCode::CONFLICT => Err(AuthError::UsernameTaken),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(AuthError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self
            .client
            .post(self.url("sign-in"))
            .json(&self.credentials_body(&credentials))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let tokens: SignInResponse = response.json().await?;
                let mut session = Session::new(credentials.username, tokens.access_token);
                if let Some(secs) = tokens.expires_in {
                    session = session.expires_at(Utc::now() + Duration::seconds(secs));
                }
                tracing::debug!(username = %session.username, "User pool sign-in succeeded");
                Ok(session)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(AuthError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        if session.access_token.is_empty() {
            return Err(AuthError::NotSignedIn);
        }

        let response = self
            .client
            .post(self.url("sign-out"))
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            tracing::debug!(username = %session.username, "User pool sign-out succeeded");
            Ok(())
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(AuthError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    if err.is_connect() || err.is_timeout() {
        AuthError::Unavailable
    } else {
        AuthError::Request(err)
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
    user_pool_id: &'a str,
    client_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
    /// Token lifetime in seconds
    #[serde(default)]
    expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};

    fn endpoints(base: &str) -> AuthEndpoints {
        AuthEndpoints {
            endpoint: base.to_string(),
            user_pool_id: "pool-1".to_string(),
            client_id: "client-1".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn sign_in_handler(
        Json(body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, AxumStatus> {
        if body["userPoolId"] != "pool-1" || body["clientId"] != "client-1" {
            return Err(AxumStatus::BAD_REQUEST);
        }
        if body["username"] == "alice" && body["password"] == "secret" {
            Ok(Json(serde_json::json!({"accessToken": "tok-alice", "expiresIn": 3600})))
        } else {
            Err(AxumStatus::UNAUTHORIZED)
        }
    }

    async fn sign_up_handler(Json(body): Json<serde_json::Value>) -> AxumStatus {
        match body["username"].as_str() {
            Some("alice") => AxumStatus::CONFLICT,
            Some(_) if body["clientId"] == "client-1" => AxumStatus::OK,
            _ => AxumStatus::BAD_REQUEST,
        }
    }

    fn pool() -> Router {
        Router::new()
            .route("/sign-up", post(sign_up_handler))
            .route("/sign-in", post(sign_in_handler))
            .route("/sign-out", post(|| async { AxumStatus::OK }))
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let base = serve(pool()).await;
        let auth = RemoteAuthenticator::new(endpoints(&base), std::time::Duration::from_secs(5)).unwrap();

        let session = auth.sign_in(Credentials::new("alice", "secret")).await.unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.access_token, "tok-alice");
        assert!(session.expires_at.is_some());

        auth.sign_out(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let base = serve(pool()).await;
        let auth = RemoteAuthenticator::new(endpoints(&base), std::time::Duration::from_secs(5)).unwrap();

        let result = auth.sign_in(Credentials::new("alice", "nope")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_unreachable() {
        let auth = RemoteAuthenticator::new(
            endpoints("http://127.0.0.1:1"),
            std::time::Duration::from_secs(2),
        )
        .unwrap();

        let result = auth.sign_in(Credentials::new("alice", "secret")).await;
        assert!(matches!(result, Err(AuthError::Unavailable)));
    }

    #[tokio::test]
    async fn test_sign_up() {
        let base = serve(pool()).await;
        let auth = RemoteAuthenticator::new(endpoints(&base), std::time::Duration::from_secs(5)).unwrap();

        auth.sign_up(Credentials::new("bob", "pw")).await.unwrap();
        assert!(matches!(
            auth.sign_up(Credentials::new("alice", "pw")).await,
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            auth.sign_up(Credentials::new("bob", "")).await,
            Err(AuthError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_without_token_skips_request() {
        // Nothing listens here; the call must fail before connecting
        let auth = RemoteAuthenticator::new(
            endpoints("http://127.0.0.1:1"),
            std::time::Duration::from_secs(2),
        )
        .unwrap();

        let result = auth.sign_out(&Session::new("alice", "")).await;
        assert!(matches!(result, Err(AuthError::NotSignedIn)));
    }
}
