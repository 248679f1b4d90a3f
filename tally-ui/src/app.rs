//! App Root Component
//!
//! The authentication gate: the sign-in form until a session exists, then
//! the tracker page.

use leptos::*;

use crate::api;
use crate::components::{ExpenseForm, ExpenseList, SignIn, Toast};
use crate::outputs::Endpoints;
use crate::state::{provide_global_state, GlobalState, LiveQuery};

/// Root application component
#[component]
pub fn App(endpoints: Endpoints) -> impl IntoView {
    provide_global_state(endpoints);
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="min-h-screen bg-gray-900 text-white flex flex-col">
            <main class="flex-1 container mx-auto max-w-2xl px-4 py-8">
                <Show
                    when=move || state.session.with(Option::is_some)
                    fallback=|| view! { <SignIn /> }
                >
                    <Tracker />
                </Show>
            </main>

            // Toast notifications
            <Toast />
        </div>
    }
}

/// Everything behind the gate. Mounting opens the live query; unmounting
/// (sign-out) closes it.
#[component]
fn Tracker() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    if let Some(session) = state.current_session() {
        match LiveQuery::open(state.clone(), &session.access_token) {
            Ok(live) => on_cleanup(move || drop(live)),
            Err(e) => state.show_error(&format!("Could not load expenses: {}", e)),
        }
    }

    let username = state
        .current_session()
        .map(|session| session.username)
        .unwrap_or_default();

    let state_clone = state.clone();
    let on_sign_out = move |_| {
        let Some(session) = state_clone.current_session() else {
            return;
        };
        let endpoints = state_clone.endpoints();
        state_clone.clear_session();

        spawn_local(async move {
            if let Err(e) = api::sign_out(&endpoints, &session).await {
                web_sys::console::error_1(&format!("Sign-out request failed: {}", e).into());
            }
        });
    };

    view! {
        <div class="space-y-8">
            <header class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">"Expense Tracker"</h1>
                <div class="flex items-center space-x-3 text-sm">
                    <span class="text-gray-400">{username}</span>
                    <button
                        on:click=on_sign_out
                        class="px-3 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg transition-colors"
                    >
                        "Sign Out"
                    </button>
                </div>
            </header>

            <ExpenseForm />
            <ExpenseList />
        </div>
    }
}
