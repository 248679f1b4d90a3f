//! Expense Form Component
//!
//! Two controlled inputs. The fields are cleared only after the backend
//! accepts the record; the list itself updates through the live query.

use leptos::*;

use crate::api;
use crate::model::validate_form;
use crate::state::global::GlobalState;

#[component]
pub fn ExpenseForm() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let name = create_rw_signal(String::new());
    let amount = create_rw_signal(String::new());
    let submitting = create_rw_signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();

        let request = match validate_form(&name.get_untracked(), &amount.get_untracked()) {
            Ok(request) => request,
            Err(e) => {
                state.show_error(&e);
                return;
            }
        };
        let Some(session) = state.current_session() else {
            return;
        };
        let endpoints = state.endpoints();
        let state = state.clone();

        submitting.set(true);
        spawn_local(async move {
            match api::create_expense(&endpoints, &session, &request).await {
                Ok(_) => {
                    name.set(String::new());
                    amount.set(String::new());
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Create failed: {}", e).into());
                    state.show_error(&format!("Could not add expense: {}", e));
                }
            }
            submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="bg-gray-800 rounded-lg p-4 border border-gray-700 space-y-3">
            <input
                type="text"
                name="name"
                placeholder="Expense name"
                class="w-full bg-gray-700 rounded-lg px-4 py-3"
                prop:value=move || name.get()
                on:input=move |ev| name.set(event_target_value(&ev))
            />
            <input
                type="number"
                step="any"
                name="amount"
                placeholder="Expense amount"
                class="w-full bg-gray-700 rounded-lg px-4 py-3"
                prop:value=move || amount.get()
                on:input=move |ev| amount.set(event_target_value(&ev))
            />
            <button
                type="submit"
                disabled=move || submitting.get()
                class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                       rounded-lg py-3 font-semibold transition-colors"
            >
                "Create Expense"
            </button>
        </form>
    }
}
