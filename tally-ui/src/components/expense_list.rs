//! Expense List Component
//!
//! Renders the last live query snapshot as cards, in delivery order.

use leptos::*;

use crate::api;
use crate::model::{render_cards, Card};
use crate::state::global::GlobalState;

#[component]
pub fn ExpenseList() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let cards = create_memo(move |_| state.expenses.with(|items| render_cards(items)));

    view! {
        <section class="space-y-3">
            <h2 class="text-xl font-semibold">"Expenses"</h2>
            <Show
                when=move || cards.with(|cards| !cards.is_empty())
                fallback=|| view! { <p class="text-gray-500">"No expenses yet"</p> }
            >
                <For
                    each=move || cards.get()
                    key=|card| card.key.clone()
                    children=move |card| view! { <ExpenseCard card=card /> }
                />
            </Show>
        </section>
    }
}

#[component]
fn ExpenseCard(card: Card) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let can_delete = card.id.is_some();
    let id = card.id.clone();

    let on_delete = move |_| {
        let Some(id) = id.clone() else {
            return;
        };
        let Some(session) = state.current_session() else {
            return;
        };
        let endpoints = state.endpoints();
        let state = state.clone();

        spawn_local(async move {
            if let Err(e) = api::delete_expense(&endpoints, &session, &id).await {
                web_sys::console::error_1(&format!("Delete failed: {}", e).into());
                state.show_error(&format!("Could not delete expense: {}", e));
            }
        });
    };

    view! {
        <div class="flex items-center justify-between bg-gray-800 rounded-lg p-4 border border-gray-700">
            <div>
                <h3 class="font-medium">{card.name}</h3>
                <p class="text-gray-400">{card.amount}</p>
            </div>
            <button
                on:click=on_delete
                disabled=!can_delete
                class="px-3 py-2 bg-red-600 hover:bg-red-700 disabled:bg-gray-600 rounded-lg text-sm"
            >
                "Delete note"
            </button>
        </div>
    }
}
