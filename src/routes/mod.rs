//! Route gateway for the CabinPi API.
//!
//! Each endpoint family lives in its own sibling module and exports a
//! subrouter; this gateway merges them and owns the shared state, so
//! `main.rs` never needs to know about individual endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::Config;

mod health;
mod ingest;
mod photos;
mod sensors;
mod user;

// ---

/// State shared by all routes: the connection pool and the immutable config.
pub type AppState = (PgPool, Config);

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(sensors::router())
        .merge(photos::router())
        .merge(user::router())
        .merge(health::router())
        .with_state((pool, config))
}

// ---

/// The `{success:false, error}` envelope every endpoint uses for failures.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Build an error-envelope response with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    // ---
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}
