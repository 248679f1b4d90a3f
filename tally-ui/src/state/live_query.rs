//! Live Query Client
//!
//! Server-sent event stream of full expense snapshots. Every message
//! replaces the list wholesale.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};

use super::global::GlobalState;
use crate::model::Snapshot;

/// An open live query. Closing it (or dropping it) stops deliveries.
pub struct LiveQuery {
    source: EventSource,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl LiveQuery {
    /// Open the live query for the signed-in user
    pub fn open(state: GlobalState, access_token: &str) -> Result<Self, String> {
        let url = state.endpoints().observe_url(access_token);
        let source = EventSource::new(&url).map_err(|e| format!("{:?}", e))?;

        let state_clone = state.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Some(text) = message_text(event.data()) {
                handle_message(&text, &state_clone);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Live query error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        web_sys::console::log_1(&"Live query opened".into());

        Ok(Self {
            source,
            _on_message: on_message,
            _on_error: on_error,
        })
    }

    pub fn close(&self) {
        self.source.set_onmessage(None);
        self.source.set_onerror(None);
        self.source.close();
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.close();
    }
}

/// Text payload of a message event; anything else is ignored
fn message_text(data: JsValue) -> Option<String> {
    data.dyn_into::<js_sys::JsString>().ok().map(String::from)
}

/// Handle one snapshot message
fn handle_message(text: &str, state: &GlobalState) {
    match serde_json::from_str::<Snapshot>(text) {
        Ok(snapshot) => state.apply_snapshot(snapshot),
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to parse snapshot: {}", e).into());
        }
    }
}
