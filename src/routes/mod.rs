//! HTTP surface of the pipeline (EMBP gateway).
//!
//! Sibling route modules each export a subrouter; this gateway merges them and
//! attaches the shared [`Config`] so `main.rs` only needs [`router`].

use axum::Router;

use crate::Config;

mod health;
mod summary;

// ---

pub fn router(config: Config) -> Router {
    // ---
    Router::new()
        .merge(summary::router())
        .merge(health::router())
        .with_state(config)
}
