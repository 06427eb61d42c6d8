//! Measurement query endpoints: latest, range, and daily rollup.
//!
//! All three read the `measurements` table through the SQL builders in
//! `schema` and decode rows via the model conversions, so the stored 0/1
//! `inverter_on` always reaches the wire as a boolean.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{error_response, AppState};
use crate::{schema, DailyReading, DailyRow, MeasurementRow, SensorReading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/sensors", get(range_handler))
        .route("/api/sensors/latest", get(latest_handler))
        .route("/api/sensors/daily", get(daily_handler))
}

/// Query parameters for the range and daily endpoints.
///
/// Everything arrives as raw strings so that validation failures produce
/// the API's own error envelope instead of an extractor rejection.
#[derive(Debug, Deserialize)]
struct WindowQuery {
    start: Option<String>,
    stop: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
struct LatestResponse {
    success: bool,
    count: usize,
    data: SensorReading,
}

#[derive(Serialize)]
struct RangeResponse {
    success: bool,
    count: usize,
    data: Vec<SensorReading>,
}

#[derive(Serialize)]
struct DailyResponse {
    success: bool,
    count: usize,
    data: Vec<DailyReading>,
}

// ---

/// Handle `GET /api/sensors/latest`: the dashboard's polling endpoint.
async fn latest_handler(State((pool, _config)): State<AppState>) -> impl IntoResponse {
    // ---
    let sql = format!("{} ORDER BY date DESC LIMIT 1", schema::select_sql());

    match sqlx::query_as::<_, MeasurementRow>(&sql)
        .fetch_optional(&pool)
        .await
    {
        Ok(Some(row)) => {
            debug!("GET /api/sensors/latest - found {}", row.date);
            (
                StatusCode::OK,
                Json(LatestResponse {
                    success: true,
                    count: 1,
                    data: row.into(),
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No measurements found"),
        Err(e) => {
            error!("Latest query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle `GET /api/sensors?start=&stop=&limit=`.
async fn range_handler(
    Query(params): Query<WindowQuery>,
    State((pool, _config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    debug!("GET /api/sensors - {:?}", params);

    let (start, stop) = match parse_window(&params) {
        Ok(window) => window,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let limit = match parse_limit(params.limit.as_deref()) {
        Ok(limit) => limit,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let sql = format!(
        "{} WHERE date >= $1 AND date <= $2 ORDER BY date DESC LIMIT $3",
        schema::select_sql()
    );

    match sqlx::query_as::<_, MeasurementRow>(&sql)
        .bind(start)
        .bind(stop)
        .bind(limit)
        .fetch_all(&pool)
        .await
    {
        Ok(rows) => {
            let data: Vec<SensorReading> = rows.into_iter().map(SensorReading::from).collect();
            info!("GET /api/sensors - returning {} readings", data.len());
            (
                StatusCode::OK,
                Json(RangeResponse {
                    success: true,
                    count: data.len(),
                    data,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Range query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle `GET /api/sensors/daily?start=&stop=`: one MAX-aggregated row per
/// calendar day in the window, newest day first.
async fn daily_handler(
    Query(params): Query<WindowQuery>,
    State((pool, _config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    debug!("GET /api/sensors/daily - {:?}", params);

    let (start, stop) = match parse_window(&params) {
        Ok(window) => window,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match sqlx::query_as::<_, DailyRow>(&schema::daily_select_sql())
        .bind(start)
        .bind(stop)
        .fetch_all(&pool)
        .await
    {
        Ok(rows) => {
            let data: Vec<DailyReading> = rows.into_iter().map(DailyReading::from).collect();
            info!("GET /api/sensors/daily - returning {} days", data.len());
            (
                StatusCode::OK,
                Json(DailyResponse {
                    success: true,
                    count: data.len(),
                    data,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Daily query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ---

/// Validate the `start`/`stop` pair. The caller is responsible for sending
/// `start <= stop`; an inverted window just returns no rows.
fn parse_window(params: &WindowQuery) -> Result<(NaiveDateTime, NaiveDateTime), &'static str> {
    // ---
    let (Some(start), Some(stop)) = (params.start.as_deref(), params.stop.as_deref()) else {
        return Err("Missing start or stop parameter");
    };

    match (parse_timestamp(start), parse_timestamp(stop)) {
        (Some(start), Some(stop)) => Ok((start, stop)),
        _ => Err("Invalid start or stop parameter"),
    }
}

/// Parse a timestamp query value. Accepts a full `YYYY-MM-DDTHH:MM:SS[.f]`
/// timestamp or a bare `YYYY-MM-DD`, which means midnight.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    // ---
    if let Ok(timestamp) = value.parse::<NaiveDateTime>() {
        return Some(timestamp);
    }

    value
        .parse::<NaiveDate>()
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Validate `limit`: default 1000, must be an integer in [1, 1000].
fn parse_limit(raw: Option<&str>) -> Result<i64, &'static str> {
    // ---
    const MESSAGE: &str = "Invalid limit parameter: must be an integer between 1 and 1000";

    match raw {
        None => Ok(1000),
        Some(raw) => match raw.parse::<i64>() {
            Ok(limit) if (1..=1000).contains(&limit) => Ok(limit),
            _ => Err(MESSAGE),
        },
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn window(start: Option<&str>, stop: Option<&str>) -> WindowQuery {
        WindowQuery {
            start: start.map(String::from),
            stop: stop.map(String::from),
            limit: None,
        }
    }

    #[test]
    fn limit_defaults_to_1000() {
        assert_eq!(parse_limit(None), Ok(1000));
    }

    #[test]
    fn limit_accepts_boundaries() {
        // ---
        assert_eq!(parse_limit(Some("1")), Ok(1));
        assert_eq!(parse_limit(Some("1000")), Ok(1000));
    }

    #[test]
    fn limit_rejects_out_of_range_and_garbage() {
        // ---
        assert!(parse_limit(Some("0")).is_err());
        assert!(parse_limit(Some("1001")).is_err());
        assert!(parse_limit(Some("-5")).is_err());
        assert!(parse_limit(Some("abc")).is_err());
        assert!(parse_limit(Some("2.5")).is_err());
    }

    #[test]
    fn timestamps_parse_full_and_bare_forms() {
        // ---
        let full = parse_timestamp("2024-01-01T06:30:15").unwrap();
        assert_eq!(full.to_string(), "2024-01-01 06:30:15");

        let bare = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(bare.to_string(), "2024-01-01 00:00:00");

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn window_requires_both_endpoints() {
        // ---
        let err = parse_window(&window(None, Some("2024-01-02"))).unwrap_err();
        assert_eq!(err, "Missing start or stop parameter");

        let err = parse_window(&window(Some("2024-01-01"), None)).unwrap_err();
        assert_eq!(err, "Missing start or stop parameter");

        assert!(parse_window(&window(Some("2024-01-01"), Some("2024-01-02"))).is_ok());
    }

    #[test]
    fn window_rejects_unparseable_endpoints() {
        // ---
        let err = parse_window(&window(Some("not-a-date"), Some("2024-01-02"))).unwrap_err();
        assert_eq!(err, "Invalid start or stop parameter");
    }
}
