//! Tally Web Page
//!
//! Expense tracker behind a sign-in gate, built with Leptos (WASM).
//!
//! # Startup
//!
//! The backend outputs document is fetched before anything mounts. If it is
//! missing or malformed the page stays empty and the error goes to the
//! console.

use leptos::*;

mod api;
mod app;
mod components;
mod model;
mod outputs;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    wasm_bindgen_futures::spawn_local(async {
        match outputs::load().await {
            Ok(endpoints) => mount_to_body(move || view! { <app::App endpoints=endpoints /> }),
            Err(e) => {
                web_sys::console::error_1(&format!("Backend configuration failed: {}", e).into());
            }
        }
    });
}
