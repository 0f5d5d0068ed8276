//! Client for the food expiry tracker API.
//!
//! [`ApiClient`] is a thin typed wrapper over the HTTP routes. [`Session`]
//! keeps local copies of the active and trash lists and applies the
//! lifecycle and gate rules before sending a mutation. [`watch`] drives the
//! periodic refresh, auto-expire sweep and expiry alerts.

pub mod alerts;
pub mod api;
pub mod error;
pub mod events;
pub mod session;
pub mod watch;

pub use alerts::AlertScheduler;
pub use api::ApiClient;
pub use error::ClientError;
pub use events::subscribe_changes;
pub use session::Session;
pub use watch::{watch, Notice, WatchOptions};
