//! Batch ingest endpoint for sensor measurements.
//!
//! Producers POST `{records: [...]}`; each record is normalized (inverter
//! consistency rule, 0/1 boolean storage) and inserted. The whole batch
//! runs inside one transaction: a failed insert rolls everything back, so a
//! 500 never leaves a half-committed prefix behind. Records without a
//! `date` are skipped silently; callers see that only as `inserted < total`
//! in the response.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{error_response, AppState};
use crate::{schema, SensorRecord};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/sensors/ingest", post(handler))
}

#[derive(Debug, Deserialize)]
struct IngestRequest {
    records: Vec<SensorRecord>,
}

#[derive(Serialize)]
struct IngestResponse {
    success: bool,
    inserted: usize,
    total: usize,
}

// ---

async fn handler(
    State((pool, _config)): State<AppState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> impl IntoResponse {
    // ---
    // A missing body, malformed JSON, or a missing/non-array `records`
    // field all land here as a rejection.
    let Ok(Json(request)) = body else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid request: records array is required",
        );
    };

    if request.records.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid request: records array is required",
        );
    }

    let total = request.records.len();
    let sql = schema::insert_sql();

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!("Failed to open ingest transaction: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let mut inserted = 0usize;

    for record in request.records {
        // ---
        let Some(date) = record.date else {
            debug!("Skipping record without date");
            continue;
        };

        let record = record.normalized();

        let query = sqlx::query(&sql).bind(date);
        let query = record.channels.bind_all(query);
        let query = query.bind(record.inverter_on_stored());

        if let Err(e) = query.execute(&mut *tx).await {
            // Dropping the transaction rolls the batch back
            error!("Insert failed, aborting batch: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }

        inserted += 1;
    }

    if let Err(e) = tx.commit().await {
        error!("Failed to commit ingest batch: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    info!("Ingested {}/{} records", inserted, total);

    (
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            inserted,
            total,
        }),
    )
        .into_response()
}
