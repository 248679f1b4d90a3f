//! State Management
//!
//! Global application state and the live query connection.

pub mod global;
pub mod live_query;

pub use global::{provide_global_state, GlobalState};
pub use live_query::LiveQuery;
