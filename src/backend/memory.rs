//! In-process backend
//!
//! Keeps the collection in memory and pushes a full snapshot to every
//! observer after each change, the way the hosted live query does. Every
//! mutation request is recorded so callers can check exactly what was sent.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::error::{BackendError, BackendResult};
use super::{ExpenseBackend, Subscription};
use crate::models::{Expense, NewExpense, Snapshot};

/// A mutation request as received by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Create(NewExpense),
    Delete(String),
}

#[derive(Default)]
struct Inner {
    records: Vec<Expense>,
    observers: Vec<mpsc::UnboundedSender<BackendResult<Snapshot>>>,
    requests: Vec<RecordedRequest>,
    /// Error returned by the next mutation instead of applying it
    fail_next: Option<(u16, String)>,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.records.clone())
    }

    /// Push the current snapshot to every live observer, dropping closed ones
    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.observers.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
    }

    fn take_failure(&mut self) -> Option<BackendError> {
        self.fail_next
            .take()
            .map(|(status, message)| BackendError::Api { status, message })
    }
}

/// Backend holding the collection in memory.
///
/// Clones share the same collection, so one clone can be handed to the view
/// while another is kept for inspection.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with records
    pub fn with_records(records: Vec<Expense>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records,
                ..Inner::default()
            })),
        }
    }

    /// Replace the whole collection, as another client's writes would, and
    /// notify observers
    pub async fn replace_all(&self, records: Vec<Expense>) {
        let mut inner = self.inner.lock().await;
        inner.records = records;
        inner.publish();
    }

    /// Re-deliver the current snapshot without changing anything
    pub async fn republish(&self) {
        self.inner.lock().await.publish();
    }

    /// Make the next create or delete fail with an API error
    pub async fn fail_next_mutation(&self, status: u16, message: impl Into<String>) {
        self.inner.lock().await.fail_next = Some((status, message.into()));
    }

    /// Mutation requests received so far, in order
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// Current contents of the collection
    pub async fn records(&self) -> Vec<Expense> {
        self.inner.lock().await.records.clone()
    }

    /// Number of observers still attached
    pub async fn observer_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.observers.retain(|tx| !tx.is_closed());
        inner.observers.len()
    }
}

#[async_trait]
impl ExpenseBackend for MemoryBackend {
    async fn observe(&self) -> BackendResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;

        tx.send(Ok(inner.snapshot()))
            .map_err(|_| BackendError::Closed)?;
        inner.observers.push(tx);

        tracing::debug!(observers = inner.observers.len(), "Live query opened");
        Ok(Subscription::new(rx))
    }

    async fn create(&self, expense: NewExpense) -> BackendResult<Expense> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(RecordedRequest::Create(expense.clone()));

        if let Some(err) = inner.take_failure() {
            return Err(err);
        }

        let amount = expense.amount_value().ok_or_else(|| BackendError::Api {
            status: 400,
            message: format!("amount is not a number: {}", expense.amount),
        })?;

        let record = Expense::new(Uuid::new_v4().to_string(), expense.name, amount)
            .timestamps(Utc::now());
        inner.records.push(record.clone());
        inner.publish();

        Ok(record)
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(RecordedRequest::Delete(id.to_string()));

        if let Some(err) = inner.take_failure() {
            return Err(err);
        }

        let before = inner.records.len();
        inner.records.retain(|r| r.id.as_deref() != Some(id));
        if inner.records.len() == before {
            return Err(BackendError::NotFound(id.to_string()));
        }

        inner.publish();
        Ok(())
    }
}
