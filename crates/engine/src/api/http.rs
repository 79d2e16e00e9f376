//! HTTP routes.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
