//! secretdrop: one-time secret exchange.
//!
//! A secret is saved under an id derived from its content and can be read
//! back exactly once; the read deletes it. The library exposes the store,
//! the HTTP router and configuration so the binary and the integration
//! tests in `tests/` share them.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod store;

use store::SecretStore;

/// Shared application state passed to handlers.
pub struct AppState {
    pub store: Arc<dyn SecretStore>,
    pub config: config::Config,
}
