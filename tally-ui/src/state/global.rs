//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;

use crate::api::Session;
use crate::model::{Expense, Snapshot};
use crate::outputs::Endpoints;

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Backend endpoints from the outputs document
    pub endpoints: StoredValue<Endpoints>,
    /// Signed-in user; `None` shows the sign-in gate
    pub session: RwSignal<Option<Session>>,
    /// Last snapshot delivered by the live query
    pub expenses: RwSignal<Vec<Expense>>,
    /// Whether the live query reports it is in step with the backend
    pub synced: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state(endpoints: Endpoints) {
    let state = GlobalState {
        endpoints: store_value(endpoints),
        session: create_rw_signal(None),
        expenses: create_rw_signal(Vec::new()),
        synced: create_rw_signal(false),
        error: create_rw_signal(None),
    };

    provide_context(state);
}

/// Whether applying `next` would change what is shown
pub fn snapshot_changes(current: &[Expense], synced: bool, next: &Snapshot) -> bool {
    current != next.items.as_slice() || synced != next.is_synced
}

impl GlobalState {
    /// Replace the list with a delivered snapshot. Identical redeliveries are
    /// ignored so nothing re-renders.
    pub fn apply_snapshot(&self, snapshot: Snapshot) {
        let changed = self.expenses.with_untracked(|current| {
            snapshot_changes(current, self.synced.get_untracked(), &snapshot)
        });
        if !changed {
            return;
        }

        self.synced.set(snapshot.is_synced);
        self.expenses.set(snapshot.items);
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints.get_value()
    }

    /// Current session, read without subscribing
    pub fn current_session(&self) -> Option<Session> {
        self.session.get_untracked()
    }

    /// End the session and drop everything shown behind the gate
    pub fn clear_session(&self) {
        self.session.set(None);
        self.expenses.set(Vec::new());
        self.synced.set(false);
        self.error.set(None);
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }

    /// Clear error message
    pub fn clear_error(&self) {
        self.error.set(None);
    }
}
