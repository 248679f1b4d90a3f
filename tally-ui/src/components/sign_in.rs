//! Sign-in Component
//!
//! The only thing rendered while signed out. Toggles between signing in and
//! creating an account; a new account is signed in right away.

use leptos::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn SignIn() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let username = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let error = create_rw_signal(Option::<String>::None);
    let submitting = create_rw_signal(false);
    let creating = create_rw_signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();

        let user = username.get_untracked();
        let pwd = password.get_untracked();
        let endpoints = state.endpoints();
        let state = state.clone();
        let sign_up_first = creating.get_untracked();

        submitting.set(true);
        error.set(None);

        spawn_local(async move {
            if sign_up_first {
                if let Err(e) = api::sign_up(&endpoints, &user, &pwd).await {
                    error.set(Some(e));
                    submitting.set(false);
                    return;
                }
            }

            match api::sign_in(&endpoints, &user, &pwd).await {
                Ok(session) => {
                    password.set(String::new());
                    state.session.set(Some(session));
                }
                Err(e) => error.set(Some(e)),
            }
            submitting.set(false);
        });
    };

    view! {
        <div class="max-w-sm mx-auto mt-16 bg-gray-800 rounded-lg p-6 border border-gray-700">
            <h1 class="text-2xl font-bold mb-6 text-center">
                {move || if creating.get() { "Create Account" } else { "Sign in" }}
            </h1>

            <form on:submit=on_submit class="space-y-4">
                <input
                    type="text"
                    placeholder="Username"
                    autocomplete="username"
                    class="w-full bg-gray-700 rounded-lg px-4 py-3"
                    prop:value=move || username.get()
                    on:input=move |ev| username.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    autocomplete="current-password"
                    class="w-full bg-gray-700 rounded-lg px-4 py-3"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />

                <Show when=move || error.get().is_some()>
                    <div class="text-red-400 text-sm">
                        {move || error.get().unwrap_or_default()}
                    </div>
                </Show>

                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                           rounded-lg py-3 font-semibold transition-colors"
                >
                    {move || match (submitting.get(), creating.get()) {
                        (true, _) => "Please wait...",
                        (false, true) => "Create Account",
                        (false, false) => "Sign in",
                    }}
                </button>
            </form>

            <button
                type="button"
                on:click=move |_| {
                    creating.update(|c| *c = !*c);
                    error.set(None);
                }
                class="w-full mt-4 text-sm text-gray-400 hover:text-white transition-colors"
            >
                {move || if creating.get() { "Have an account? Sign in" } else { "No account? Create one" }}
            </button>
        </div>
    }
}
