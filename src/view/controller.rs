//! Expense tracker controller
//!
//! Owns the view state behind the authentication gate and wires user actions
//! to the backend. The list is only ever written by the live query task;
//! create and delete go to the backend and come back through the next
//! snapshot.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::auth::{AuthError, Authenticator, Credentials, SessionStore};
use crate::backend::{BackendError, BackendResult, ExpenseBackend};
use crate::bootstrap::Tally;
use crate::models::Snapshot;

use super::form::{ExpenseForm, FormError};
use super::list::ExpenseList;
use super::page::{render_cards, Card, Notice, Page, SignInView, TrackerView};

/// Actions the view refuses before anything reaches the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Expense has no identifier yet")]
    MissingIdentifier,
}

#[derive(Debug, Default)]
struct ViewState {
    list: ExpenseList,
    form: ExpenseForm,
    notice: Option<Notice>,
    sign_in_error: Option<String>,
}

struct Shared {
    state: RwLock<ViewState>,
    /// Bumped after every visible change
    changes: watch::Sender<u64>,
}

impl Shared {
    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    async fn apply(&self, snapshot: Snapshot) {
        let count = snapshot.items.len();
        let changed = self.state.write().await.list.replace(snapshot);
        if changed {
            tracing::debug!(count, "Applied snapshot");
            self.notify();
        }
    }

    async fn set_notice(&self, notice: Notice) {
        self.state.write().await.notice = Some(notice);
        self.notify();
    }
}

/// The expense tracker page behind its sign-in gate.
///
/// Clones share state, so one clone can drive input while another renders.
#[derive(Clone)]
pub struct ExpenseApp {
    shared: Arc<Shared>,
    sessions: SessionStore,
    backend: Arc<dyn ExpenseBackend>,
    authenticator: Arc<dyn Authenticator>,
    /// Task applying live query snapshots while signed in
    subscription: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ExpenseApp {
    pub fn new(tally: &Tally) -> Self {
        Self::from_parts(
            tally.sessions().clone(),
            tally.backend(),
            tally.authenticator(),
        )
    }

    pub fn from_parts(
        sessions: SessionStore,
        backend: Arc<dyn ExpenseBackend>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(ViewState::default()),
                changes,
            }),
            sessions,
            backend,
            authenticator,
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    /// Receiver that wakes whenever the rendered page may have changed
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    pub fn is_signed_in(&self) -> bool {
        self.sessions.is_signed_in()
    }

    /// Create an account, then sign in with it
    pub async fn sign_up(&self, credentials: Credentials) -> Result<(), AuthError> {
        if let Err(e) = self.authenticator.sign_up(credentials.clone()).await {
            tracing::info!(username = %credentials.username, error = %e, "Sign-up failed");
            self.shared.state.write().await.sign_in_error = Some(e.to_string());
            self.shared.notify();
            return Err(e);
        }

        tracing::info!(username = %credentials.username, "Signed up");
        self.sign_in(credentials).await
    }

    /// Authenticate and, on success, open the live query
    pub async fn sign_in(&self, credentials: Credentials) -> Result<(), AuthError> {
        let username = credentials.username.clone();

        let session = match self.authenticator.sign_in(credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(username = %username, error = %e, "Sign-in failed");
                self.shared.state.write().await.sign_in_error = Some(e.to_string());
                self.shared.notify();
                return Err(e);
            }
        };

        self.sessions.set(session);
        self.shared.state.write().await.sign_in_error = None;
        tracing::info!(username = %username, "Signed in");

        if let Err(e) = self.mount().await {
            tracing::warn!(error = %e, "Failed to open live query");
            self.shared
                .set_notice(Notice::Error(format!("Could not load expenses: {}", e)))
                .await;
        }
        self.shared.notify();
        Ok(())
    }

    /// Open the live query and keep the list in step with it.
    ///
    /// Replaces any subscription already running.
    pub async fn mount(&self) -> BackendResult<()> {
        if !self.sessions.is_signed_in() {
            return Err(BackendError::Unauthenticated);
        }

        let mut subscription = self.backend.observe().await?;
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            while let Some(delivery) = subscription.next().await {
                match delivery {
                    Ok(snapshot) => shared.apply(snapshot).await,
                    Err(BackendError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "Live query delivery failed"),
                }
            }
            tracing::debug!("Live query ended");
        });

        if let Some(previous) = self.subscription.lock().await.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    /// Replace the form contents with what the user typed
    pub async fn set_form(&self, form: ExpenseForm) {
        self.shared.state.write().await.form = form;
        self.shared.notify();
    }

    /// Submit the form.
    ///
    /// Invalid input is refused without contacting the backend. Otherwise the
    /// create request runs in the background; the form is cleared only once it
    /// succeeds, and a failure leaves the form and list untouched.
    pub async fn submit(&self) -> Result<JoinHandle<()>, ViewError> {
        if !self.sessions.is_signed_in() {
            return Err(ViewError::NotSignedIn);
        }

        let (submitted, request) = {
            let state = self.shared.state.read().await;
            (state.form.clone(), state.form.to_request()?)
        };

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        let sessions = self.sessions.clone();

        Ok(tokio::spawn(async move {
            match backend.create(request).await {
                Ok(expense) => {
                    tracing::info!(id = ?expense.id, name = %expense.name, "Created expense");
                    let mut state = shared.state.write().await;
                    if state.form == submitted {
                        state.form.reset();
                    }
                    drop(state);
                    shared.notify();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create expense");
                    if sessions.is_signed_in() {
                        shared
                            .set_notice(Notice::Error(format!("Could not add expense: {}", e)))
                            .await;
                    }
                }
            }
        }))
    }

    /// Ask the backend to delete the record with `id`
    pub fn delete(&self, id: &str) -> Result<JoinHandle<()>, ViewError> {
        if !self.sessions.is_signed_in() {
            return Err(ViewError::NotSignedIn);
        }

        let id = id.to_string();
        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        let sessions = self.sessions.clone();

        Ok(tokio::spawn(async move {
            match backend.delete(&id).await {
                Ok(()) => tracing::info!(id = %id, "Deleted expense"),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Failed to delete expense");
                    if sessions.is_signed_in() {
                        shared
                            .set_notice(Notice::Error(format!("Could not delete expense: {}", e)))
                            .await;
                    }
                }
            }
        }))
    }

    /// Delete the record behind a rendered card
    pub fn delete_card(&self, card: &Card) -> Result<JoinHandle<()>, ViewError> {
        match &card.id {
            Some(id) => self.delete(id),
            None => Err(ViewError::MissingIdentifier),
        }
    }

    /// End the session, stop the live query and return to the sign-in page
    pub async fn sign_out(&self) {
        let session = self.sessions.clear();

        if let Some(task) = self.subscription.lock().await.take() {
            task.abort();
        }
        *self.shared.state.write().await = ViewState::default();
        self.shared.notify();

        if let Some(session) = session {
            if let Err(e) = self.authenticator.sign_out(&session).await {
                tracing::warn!(username = %session.username, error = %e, "Sign-out request failed");
            }
            tracing::info!(username = %session.username, "Signed out");
        }
    }

    pub async fn dismiss_notice(&self) {
        self.shared.state.write().await.notice = None;
        self.shared.notify();
    }

    /// Current page for rendering
    pub async fn page(&self) -> Page {
        let state = self.shared.state.read().await;

        match self.sessions.current() {
            None => Page::SignIn(SignInView {
                error: state.sign_in_error.clone(),
            }),
            Some(session) => Page::Tracker(TrackerView {
                username: session.username,
                form: state.form.clone(),
                cards: render_cards(state.list.items()),
                is_synced: state.list.is_synced(),
                notice: state.notice.clone(),
            }),
        }
    }
}
