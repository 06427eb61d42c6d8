//! Trail-camera photo endpoints.
//!
//! The photo archive lives behind a separate upstream service; these routes
//! are thin proxies. The listing passes JSON through untouched; the photo
//! fetch streams the image bytes back with the upstream content type and a
//! day-long cache header. Cloudflare Access service credentials from the
//! config are forwarded when present.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use tracing::error;

use super::{error_response, AppState};
use crate::Config;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/photos", get(list_handler))
        .route("/api/photos/{filename}", get(photo_handler))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoQuery {
    size: Option<String>,
}

// ---

/// Handle `GET /api/photos?date=`: list photos for a date (or the most
/// recent date when omitted). Upstream JSON is passed through as-is.
async fn list_handler(
    Query(params): Query<ListQuery>,
    State((_pool, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let path = match &params.date {
        Some(date) => format!("/api/photos?date={date}"),
        None => "/api/photos".to_string(),
    };

    let response = match upstream_get(&config, &path).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Photo listing request failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let status = upstream_status(&response);
    if !status.is_success() {
        return error_response(status, format!("API request failed: {}", status.as_u16()));
    }

    match response.json::<serde_json::Value>().await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Photo listing returned invalid JSON: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle `GET /api/photos/{filename}?size=`: stream one image through,
/// preserving the upstream content type.
async fn photo_handler(
    Path(filename): Path<String>,
    Query(params): Query<PhotoQuery>,
    State((_pool, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let path = match &params.size {
        Some(size) => format!("/api/photos/{filename}?size={size}"),
        None => format!("/api/photos/{filename}"),
    };

    let response = match upstream_get(&config, &path).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Photo fetch failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let status = upstream_status(&response);
    if !status.is_success() {
        return error_response(status, format!("API request failed: {}", status.as_u16()));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    match response.bytes().await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                // Trail-cam photos never change once written
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Photo body read failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ---

/// Build a GET request to the photo upstream, attaching the Cloudflare
/// Access service credentials when both halves are configured.
fn upstream_get(config: &Config, path_and_query: &str) -> reqwest::RequestBuilder {
    // ---
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}{}", config.photos_api_url, path_and_query));

    if let (Some(id), Some(secret)) = (&config.access_client_id, &config.access_client_secret) {
        request = request
            .header("CF-Access-Client-Id", id)
            .header("CF-Access-Client-Secret", secret);
    }

    request
}

/// Translate the upstream status into our response status.
fn upstream_status(response: &reqwest::Response) -> StatusCode {
    // ---
    StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
