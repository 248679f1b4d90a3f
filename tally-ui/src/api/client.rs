//! HTTP API Client
//!
//! Sign-up and sign-in against the user pool and mutations against the expense
//! collection. Reads never go through here; the list comes from the live
//! query.

use gloo_net::http::{Request, Response};

use crate::model::{Expense, NewExpense};
use crate::outputs::Endpoints;

/// Signed-in user
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub username: String,
    pub access_token: String,
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
    user_pool_id: &'a str,
    client_id: &'a str,
}

fn bearer(session: &Session) -> String {
    format!("Bearer {}", session.access_token)
}

/// Turn a non-success response into a message for the user
async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(ApiError { message: Some(message), .. }) | Ok(ApiError { error: Some(message), .. }) => {
            message
        }
        _ => format!("Request failed with status {}", status),
    }
}

/// Register a new account. The caller signs in afterwards.
pub async fn sign_up(endpoints: &Endpoints, username: &str, password: &str) -> Result<(), String> {
    if username.is_empty() || password.is_empty() {
        return Err("Username and password are required".to_string());
    }

    let response = Request::post(&format!("{}/sign-up", endpoints.auth_url))
        .json(&CredentialsRequest {
            username,
            password,
            user_pool_id: &endpoints.user_pool_id,
            client_id: &endpoints.client_id,
        })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    match response.status() {
        200..=299 => Ok(()),
        409 => Err("Username already exists".to_string()),
        _ => Err(error_message(response).await),
    }
}

pub async fn sign_in(
    endpoints: &Endpoints,
    username: &str,
    password: &str,
) -> Result<Session, String> {
    if username.is_empty() || password.is_empty() {
        return Err("Username and password are required".to_string());
    }

    let response = Request::post(&format!("{}/sign-in", endpoints.auth_url))
        .json(&CredentialsRequest {
            username,
            password,
            user_pool_id: &endpoints.user_pool_id,
            client_id: &endpoints.client_id,
        })
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    match response.status() {
        200..=299 => {}
        401 | 403 => return Err("Incorrect username or password".to_string()),
        _ => return Err(error_message(response).await),
    }

    let body: SignInResponse = response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;

    Ok(Session {
        username: username.to_string(),
        access_token: body.access_token,
    })
}

pub async fn sign_out(endpoints: &Endpoints, session: &Session) -> Result<(), String> {
    let response = Request::post(&format!("{}/sign-out", endpoints.auth_url))
        .header("Authorization", &bearer(session))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }
    Ok(())
}

pub async fn create_expense(
    endpoints: &Endpoints,
    session: &Session,
    expense: &NewExpense,
) -> Result<Expense, String> {
    let response = Request::post(&endpoints.collection_url())
        .header("Authorization", &bearer(session))
        .json(expense)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

pub async fn delete_expense(
    endpoints: &Endpoints,
    session: &Session,
    id: &str,
) -> Result<(), String> {
    let response = Request::delete(&endpoints.record_url(id))
        .header("Authorization", &bearer(session))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(error_message(response).await);
    }
    Ok(())
}
