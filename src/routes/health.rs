//! API health check endpoint for the CabinPi backend.
//!
//! The `/health` route lets container orchestrators and the cabin's uptime
//! monitor verify the service is running and able to answer HTTP requests.
//! It deliberately does not touch the database or the photo upstream: a
//! degraded dependency should surface on its own endpoint, not take the
//! probe down with it.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the
/// gateway router, regardless of the state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
