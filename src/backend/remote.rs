//! Hosted backend client
//!
//! REST calls for create/delete and a server-sent events stream for the live
//! query. Every request is authorized with the bearer token of the current
//! user pool session.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::error::{BackendError, BackendResult};
use super::sse::SseDecoder;
use super::{ExpenseBackend, Subscription};
use crate::auth::SessionStore;
use crate::models::{Expense, NewExpense, Snapshot};

/// Where the expense collection is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEndpoints {
    /// Base URL for REST calls, without trailing slash
    pub url: String,
    /// Base URL for the live query stream, without trailing slash
    pub realtime_url: String,
    /// Model (collection) name, e.g. "Expense"
    pub model: String,
}

/// Backend client bound to the authenticated-user access mode
pub struct RemoteBackend {
    /// Client for one-shot requests (bounded by the request timeout)
    client: Client,
    /// Client for the long-lived live query stream (connect timeout only)
    stream_client: Client,
    endpoints: DataEndpoints,
    sessions: SessionStore,
}

impl RemoteBackend {
    pub fn new(
        endpoints: DataEndpoints,
        sessions: SessionStore,
        request_timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        let stream_client = Client::builder().connect_timeout(request_timeout).build()?;

        Ok(Self {
            client,
            stream_client,
            endpoints,
            sessions,
        })
    }

    pub fn endpoints(&self) -> &DataEndpoints {
        &self.endpoints
    }

    fn collection_url(&self) -> String {
        format!("{}/models/{}", self.endpoints.url, self.endpoints.model)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id))
    }

    fn observe_url(&self) -> String {
        format!(
            "{}/models/{}/observe",
            self.endpoints.realtime_url, self.endpoints.model
        )
    }

    fn bearer(&self) -> BackendResult<String> {
        self.sessions
            .access_token()
            .ok_or(BackendError::Unauthenticated)
    }

    /// One-shot read of the whole collection
    pub async fn list(&self) -> BackendResult<Vec<Expense>> {
        let response = self
            .client
            .get(self.collection_url())
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        let response = check_status(response, None).await?;
        let page: ListResponse = response.json().await?;
        Ok(page.items)
    }
}

#[async_trait]
impl ExpenseBackend for RemoteBackend {
    async fn observe(&self) -> BackendResult<Subscription> {
        let url = self.observe_url();
        let response = self
            .stream_client
            .get(&url)
            .bearer_auth(self.bearer()?)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        let response = check_status(response, None).await?;
        tracing::info!(url = %url, "Live query opened");

        let (tx, rx) = mpsc::unbounded_channel();
        let feeder = tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            let mut body = Box::pin(response.bytes_stream());

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(BackendError::from_transport(e)));
                        return;
                    }
                };

                let payloads = match decoder.feed(&chunk) {
                    Ok(payloads) => payloads,
                    Err(e) => {
                        tracing::warn!(error = %e, "Abandoning live query stream");
                        let _ = tx.send(Err(e));
                        return;
                    }
                };

                for payload in payloads {
                    let snapshot = serde_json::from_str::<Snapshot>(&payload)
                        .map_err(BackendError::from);
                    if tx.send(snapshot).is_err() {
                        // Subscriber went away
                        return;
                    }
                }
            }

            tracing::debug!("Live query stream ended");
            let _ = tx.send(Err(BackendError::Closed));
        });

        Ok(Subscription::with_feeder(rx, feeder))
    }

    async fn create(&self, expense: NewExpense) -> BackendResult<Expense> {
        let response = self
            .client
            .post(self.collection_url())
            .bearer_auth(self.bearer()?)
            .json(&expense)
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        let response = check_status(response, None).await?;
        let created: Expense = response.json().await?;

        tracing::debug!(
            expense_id = created.id.as_deref().unwrap_or("-"),
            name = %created.name,
            "Expense created"
        );
        Ok(created)
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        let response = self
            .client
            .delete(self.record_url(id))
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        check_status(response, Some(id)).await?;
        tracing::debug!(expense_id = %id, "Expense deleted");
        Ok(())
    }
}

/// Map non-success responses to errors, passing successful ones through
async fn check_status(response: Response, id: Option<&str>) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match (status, id) {
        (StatusCode::UNAUTHORIZED, _) => Err(BackendError::Unauthenticated),
        (StatusCode::NOT_FOUND, Some(id)) => Err(BackendError::NotFound(id.to_string())),
        (StatusCode::SERVICE_UNAVAILABLE, _) => Err(BackendError::Unavailable),
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(BackendError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Expense>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode as AxumStatus},
        response::sse::{Event, KeepAlive, Sse},
        routing::{delete, get},
        Json, Router,
    };
    use futures_util::stream::{self, Stream};
    use std::convert::Infallible;
    use std::sync::Arc;
    use tokio::sync::{broadcast, Mutex};

    /// Minimal stand-in for the managed backend
    #[derive(Clone)]
    struct FakeBackend {
        records: Arc<Mutex<Vec<Expense>>>,
        changes: broadcast::Sender<Vec<Expense>>,
        next_id: Arc<Mutex<u32>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            let (changes, _) = broadcast::channel(16);
            Self {
                records: Arc::new(Mutex::new(Vec::new())),
                changes,
                next_id: Arc::new(Mutex::new(1)),
            }
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "Bearer tok-test")
            .unwrap_or(false)
    }

    async fn list_handler(
        State(fake): State<FakeBackend>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, AxumStatus> {
        if !authorized(&headers) {
            return Err(AxumStatus::UNAUTHORIZED);
        }
        let records = fake.records.lock().await.clone();
        Ok(Json(serde_json::json!({ "items": records })))
    }

    async fn create_handler(
        State(fake): State<FakeBackend>,
        headers: HeaderMap,
        Json(body): Json<NewExpense>,
    ) -> Result<Json<Expense>, AxumStatus> {
        if !authorized(&headers) {
            return Err(AxumStatus::UNAUTHORIZED);
        }
        let amount = body.amount_value().ok_or(AxumStatus::BAD_REQUEST)?;
        let id = {
            let mut next = fake.next_id.lock().await;
            let id = format!("rec-{}", *next);
            *next += 1;
            id
        };
        let expense = Expense::new(id, body.name, amount);
        let mut records = fake.records.lock().await;
        records.push(expense.clone());
        let _ = fake.changes.send(records.clone());
        Ok(Json(expense))
    }

    async fn delete_handler(
        State(fake): State<FakeBackend>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AxumStatus {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED;
        }
        let mut records = fake.records.lock().await;
        let before = records.len();
        records.retain(|r| r.id.as_deref() != Some(id.as_str()));
        if records.len() == before {
            return AxumStatus::NOT_FOUND;
        }
        let _ = fake.changes.send(records.clone());
        AxumStatus::OK
    }

    async fn observe_handler(
        State(fake): State<FakeBackend>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let initial = fake.records.lock().await.clone();
        let rx = fake.changes.subscribe();

        let first = stream::once(async move { initial });
        let rest = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(records) => return Some((records, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        let events = first.chain(rest).map(|items| {
            let snapshot = Snapshot::new(items);
            Ok(Event::default().data(serde_json::to_string(&snapshot).unwrap_or_default()))
        });

        Sse::new(events).keep_alive(KeepAlive::new().text("keep-alive"))
    }

    async fn serve(fake: FakeBackend) -> String {
        let router = Router::new()
            .route("/models/Expense", get(list_handler).post(create_handler))
            .route("/models/Expense/:id", delete(delete_handler))
            .route("/models/Expense/observe", get(observe_handler))
            .with_state(fake);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn backend(base: &str, sessions: SessionStore) -> RemoteBackend {
        let endpoints = DataEndpoints {
            url: base.to_string(),
            realtime_url: base.to_string(),
            model: "Expense".to_string(),
        };
        RemoteBackend::new(endpoints, sessions, Duration::from_secs(5)).unwrap()
    }

    fn signed_in() -> SessionStore {
        let sessions = SessionStore::new();
        sessions.set(Session::new("alice", "tok-test"));
        sessions
    }

    #[tokio::test]
    async fn test_requires_session() {
        let base = serve(FakeBackend::new()).await;
        let client = backend(&base, SessionStore::new());

        let result = client.create(NewExpense::new("Coffee", "4.50")).await;
        assert!(matches!(result, Err(BackendError::Unauthenticated)));
        assert!(matches!(client.observe().await, Err(BackendError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let base = serve(FakeBackend::new()).await;
        let sessions = SessionStore::new();
        sessions.set(Session::new("alice", "stale"));
        let client = backend(&base, sessions);

        let result = client.list().await;
        assert!(matches!(result, Err(BackendError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let base = serve(FakeBackend::new()).await;
        let client = backend(&base, signed_in());

        let created = client.create(NewExpense::new("Coffee", "4.50")).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("rec-1"));
        assert_eq!(created.amount, 4.5);

        let items = client.list().await.unwrap();
        assert_eq!(items.len(), 1);

        client.delete("rec-1").await.unwrap();
        assert!(client.list().await.unwrap().is_empty());

        let missing = client.delete("rec-1").await;
        assert!(matches!(missing, Err(BackendError::NotFound(id)) if id == "rec-1"));
    }

    #[tokio::test]
    async fn test_observe_delivers_full_snapshots() {
        let base = serve(FakeBackend::new()).await;
        let client = backend(&base, signed_in());

        let mut subscription = client.observe().await.unwrap();
        let initial = subscription.next().await.unwrap().unwrap();
        assert!(initial.items.is_empty());
        assert!(initial.is_synced);

        client.create(NewExpense::new("Coffee", "4.50")).await.unwrap();
        let after_create = subscription.next().await.unwrap().unwrap();
        assert_eq!(after_create.items.len(), 1);
        assert_eq!(after_create.items[0].name, "Coffee");

        client.create(NewExpense::new("Bagel", "3")).await.unwrap();
        let after_second = subscription.next().await.unwrap().unwrap();
        assert_eq!(after_second.items.len(), 2);

        client.delete("rec-1").await.unwrap();
        let after_delete = subscription.next().await.unwrap().unwrap();
        assert_eq!(after_delete.items.len(), 1);
        assert_eq!(after_delete.items[0].name, "Bagel");
    }

    #[test]
    fn test_record_url_encodes_id() {
        let client = backend("http://localhost:9", SessionStore::new());
        assert_eq!(
            client.record_url("a b/c"),
            "http://localhost:9/models/Expense/a%20b%2Fc"
        );
        assert_eq!(
            client.observe_url(),
            "http://localhost:9/models/Expense/observe"
        );
    }
}
