//! Managed Backend Client
//!
//! The expense collection lives in an external managed backend. This module
//! defines the contract the rest of the application relies on and provides
//! two implementations of it.
//!
//! ## Architecture
//!
//! - **ExpenseBackend**: live query, create and delete over the collection
//! - **RemoteBackend**: REST + server-sent events client for the hosted backend
//! - **MemoryBackend**: in-process backend for tests and offline runs
//! - **Subscription**: single-consumer channel of full snapshots
//!
//! ## Data Flow
//!
//! 1. `observe()` opens the live query and returns a `Subscription`
//! 2. Every change on the backend (from any client) pushes a full `Snapshot`
//! 3. `create()` / `delete()` mutate the backend; the result shows up through
//!    the next snapshot, never by patching local state

mod error;
mod memory;
mod remote;
mod sse;

pub use error::{BackendError, BackendResult};
pub use memory::{MemoryBackend, RecordedRequest};
pub use remote::{DataEndpoints, RemoteBackend};
pub use sse::SseDecoder;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{Expense, NewExpense, Snapshot};

/// Operations the managed backend exposes over the expense collection
#[async_trait]
pub trait ExpenseBackend: Send + Sync {
    /// Open a live query over the collection.
    ///
    /// The subscription delivers the current snapshot first, then a new full
    /// snapshot after every change.
    async fn observe(&self) -> BackendResult<Subscription>;

    /// Persist a new record and return it with its assigned identifier
    async fn create(&self, expense: NewExpense) -> BackendResult<Expense>;

    /// Remove the record with the given identifier
    async fn delete(&self, id: &str) -> BackendResult<()>;
}

/// Receiving end of a live query.
///
/// Dropping the subscription stops the task feeding it, if any.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<BackendResult<Snapshot>>,
    feeder: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a channel that something else keeps feeding
    pub fn new(rx: mpsc::UnboundedReceiver<BackendResult<Snapshot>>) -> Self {
        Self { rx, feeder: None }
    }

    /// Wrap a channel fed by a task owned by this subscription
    pub fn with_feeder(
        rx: mpsc::UnboundedReceiver<BackendResult<Snapshot>>,
        feeder: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            feeder: Some(feeder),
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the backend side has gone away.
    pub async fn next(&mut self) -> Option<BackendResult<Snapshot>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_yields_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = Subscription::new(rx);

        tx.send(Ok(Snapshot::new(vec![]))).unwrap();
        tx.send(Ok(Snapshot::new(vec![Expense::new("1", "Tea", 2.0)])))
            .unwrap();
        drop(tx);

        let first = subscription.next().await.unwrap().unwrap();
        assert!(first.items.is_empty());
        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_feeder() {
        let (_tx, rx) = mpsc::unbounded_channel::<BackendResult<Snapshot>>();
        let marker = std::sync::Arc::new(());
        let held = std::sync::Arc::clone(&marker);
        let feeder = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<()>().await;
        });

        tokio::task::yield_now().await;
        assert_eq!(std::sync::Arc::strong_count(&marker), 2);

        let subscription = Subscription::with_feeder(rx, feeder);
        drop(subscription);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(std::sync::Arc::strong_count(&marker), 1);
    }
}
