//! HTTP request handlers.

pub mod attachments;

pub use attachments::{attach, detach, download};

use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

/// GET /-/ping - Liveness probe.
pub async fn ping() -> impl IntoResponse {
    Json(json!({}))
}
