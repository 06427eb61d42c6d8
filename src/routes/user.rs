//! Identity endpoint backed by trusted proxy headers.
//!
//! The service sits behind Cloudflare Access, which injects
//! `cf-access-*` headers after authenticating the browser. There is no
//! session state here: the headers are the session. No email header means
//! the request never passed the access proxy.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use serde::Serialize;

// ---

/// 401 body; carries `authenticated` so clients can branch without
/// inspecting the status code.
#[derive(Serialize)]
struct Unauthenticated {
    success: bool,
    authenticated: bool,
    error: &'static str,
}

#[derive(Serialize)]
struct UserBody {
    email: String,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    name: String,
}

#[derive(Serialize)]
struct UserResponse {
    success: bool,
    authenticated: bool,
    user: UserBody,
}

/// Handle `GET /api/user`.
async fn handler(headers: HeaderMap) -> impl IntoResponse {
    // ---
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    };

    let Some(email) = header_str("cf-access-authenticated-user-email") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(Unauthenticated {
                success: false,
                authenticated: false,
                error: "Not authenticated",
            }),
        )
            .into_response();
    };

    let user_id = header_str("cf-access-user-id");

    // Fall back to the mailbox name when the proxy sends no display name
    let name = header_str("cf-access-user-name")
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    (
        StatusCode::OK,
        [(
            header::CACHE_CONTROL,
            "private, no-cache, no-store, must-revalidate",
        )],
        Json(UserResponse {
            success: true,
            authenticated: true,
            user: UserBody {
                email,
                user_id,
                name,
            },
        }),
    )
        .into_response()
}

/// Create a subrouter containing the `/api/user` route.
///
/// Generic over the application state so it merges cleanly with the
/// gateway router; the handler itself only reads request headers.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api/user", get(handler))
}
