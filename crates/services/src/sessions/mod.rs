//! Per-browser answer sessions.
//!
//! A session carries nothing but the combo streak of one client. Sessions
//! live in process memory and are forgotten after a period of inactivity.

mod store;

pub use store::{InMemorySessionStore, SessionStore};
