//! End-to-end tests against a running CabinPi API instance.
//!
//! Run with `BASE_URL=http://localhost:8080 cargo test --test
//! integration_test` once the server and its Postgres are up. Each test
//! skips cleanly when `BASE_URL` is unset, so the suite is safe in
//! environments without a live stack.
//!
//! Tests write into far-future date windows (distinct century-offset base
//! years per test, plus a per-run day offset) so runs do not interfere with
//! real telemetry or with each other.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

// ---

fn base_url() -> Option<String> {
    std::env::var("BASE_URL").ok()
}

/// A day unique to this test run within the given base year.
fn unique_day(base_year: i32) -> NaiveDate {
    // ---
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();

    NaiveDate::from_ymd_opt(base_year, 1, 1).expect("valid base year") + Days::new(secs % 36_500)
}

fn ts(day: NaiveDate, hour: u32) -> String {
    format!("{day}T{hour:02}:00:00")
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
    success: bool,
    inserted: usize,
    total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reading {
    date: String,
    amp_hours: Option<f64>,
    watts: Option<f64>,
    dispavg_vbatt: Option<f64>,
    inverter_aac_out: Option<f64>,
    inverter_vac_out: Option<f64>,
    inverter_fault: Option<f64>,
    inverter_on: bool,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    count: usize,
    data: Vec<Reading>,
}

async fn ingest(client: &Client, base: &str, records: serde_json::Value) -> Result<IngestResponse> {
    // ---
    let response = client
        .post(format!("{base}/api/sensors/ingest"))
        .json(&json!({ "records": records }))
        .send()
        .await?;

    assert_eq!(response.status(), 201, "ingest should return 201 Created");
    Ok(response.json().await?)
}

async fn range(client: &Client, base: &str, start: &str, stop: &str) -> Result<ListResponse> {
    // ---
    Ok(client
        .get(format!("{base}/api/sensors?start={start}&stop={stop}"))
        .send()
        .await?
        .json()
        .await?)
}

// ---

#[tokio::test]
async fn ingest_applies_inverter_consistency_rule() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live integration test");
        return Ok(());
    };
    let client = Client::new();
    let day = unique_day(2100);

    // One healthy reading, one identical but faulted
    let healthy = ts(day, 0);
    let faulted = ts(day, 1);
    let response = ingest(
        &client,
        &base,
        json!([
            {
                "date": healthy,
                "dispavgVbatt": 12.6,
                "inverterOn": true,
                "inverterAacOut": 3.2,
                "inverterVacOut": 120.0,
                "inverterFault": 0
            },
            {
                "date": faulted,
                "dispavgVbatt": 12.6,
                "inverterOn": true,
                "inverterAacOut": 3.2,
                "inverterVacOut": 120.0,
                "inverterFault": 5
            }
        ]),
    )
    .await?;

    assert!(response.success);
    assert_eq!(response.inserted, 2);
    assert_eq!(response.total, 2);

    let listing = range(&client, &base, &ts(day, 0), &ts(day, 23)).await?;
    assert!(listing.success);
    assert_eq!(listing.count, 2);

    // Descending by date: the faulted (later) reading comes first
    let faulted_row = &listing.data[0];
    assert_eq!(faulted_row.date, faulted);
    assert_eq!(faulted_row.inverter_fault, Some(5.0));
    assert_eq!(faulted_row.inverter_aac_out, None);
    assert_eq!(faulted_row.inverter_vac_out, None);
    assert!(!faulted_row.inverter_on);

    let healthy_row = &listing.data[1];
    assert_eq!(healthy_row.date, healthy);
    assert_eq!(healthy_row.dispavg_vbatt, Some(12.6));
    assert_eq!(healthy_row.inverter_aac_out, Some(3.2));
    assert_eq!(healthy_row.inverter_vac_out, Some(120.0));
    assert!(healthy_row.inverter_on);

    Ok(())
}

#[tokio::test]
async fn dateless_records_are_skipped_not_fatal() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live integration test");
        return Ok(());
    };
    let client = Client::new();
    let day = unique_day(2200);

    let response = ingest(
        &client,
        &base,
        json!([
            { "date": ts(day, 0), "ampHours": 1.0 },
            { "ampHours": 2.0 },
            { "date": ts(day, 1), "ampHours": 3.0 },
            { "ampHours": 4.0 },
            { "date": ts(day, 2), "ampHours": 5.0 }
        ]),
    )
    .await?;

    assert!(response.success);
    assert_eq!(response.inserted, 3);
    assert_eq!(response.total, 5);

    // Exactly the three dated records are visible
    let listing = range(&client, &base, &ts(day, 0), &ts(day, 23)).await?;
    assert_eq!(listing.count, 3);

    Ok(())
}

#[tokio::test]
async fn latest_matches_head_of_full_range() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live integration test");
        return Ok(());
    };
    let client = Client::new();
    // Highest base year in this suite, so concurrent tests cannot slip a
    // newer row in between the two fetches below
    let day = unique_day(2500);

    // Make sure at least one row exists
    ingest(
        &client,
        &base,
        json!([{ "date": ts(day, 12), "dispavgVbatt": 13.1 }]),
    )
    .await?;

    #[derive(Deserialize)]
    struct LatestResponse {
        success: bool,
        count: usize,
        data: Reading,
    }

    let latest: LatestResponse = client
        .get(format!("{base}/api/sensors/latest"))
        .send()
        .await?
        .json()
        .await?;
    assert!(latest.success);
    assert_eq!(latest.count, 1);

    let head = client
        .get(format!(
            "{base}/api/sensors?start=1970-01-01&stop=3000-01-01&limit=1"
        ))
        .send()
        .await?;
    assert_eq!(head.status(), 200);
    let head: ListResponse = head.json().await?;
    assert_eq!(head.count, 1);

    // The latest endpoint is exactly the head of the descending range
    assert_eq!(latest.data.date, head.data[0].date);
    assert_eq!(latest.data.amp_hours, head.data[0].amp_hours);
    assert_eq!(latest.data.inverter_on, head.data[0].inverter_on);

    Ok(())
}

#[tokio::test]
async fn limit_boundaries_are_accepted() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live integration test");
        return Ok(());
    };
    let client = Client::new();

    for limit in [1usize, 1000] {
        let response = client
            .get(format!(
                "{base}/api/sensors?start=1970-01-01&stop=3000-01-01&limit={limit}"
            ))
            .send()
            .await?;
        assert_eq!(response.status(), 200, "limit {limit} should be accepted");

        let listing: ListResponse = response.json().await?;
        assert!(listing.success);
        assert!(listing.data.len() <= limit, "limit {limit} exceeded");
    }

    Ok(())
}

#[tokio::test]
async fn daily_rollup_takes_per_day_maxima() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live integration test");
        return Ok(());
    };
    let client = Client::new();
    let first = unique_day(2400);
    let second = first + Days::new(1);

    ingest(
        &client,
        &base,
        json!([
            { "date": ts(first, 8), "ampHours": 10.0 },
            { "date": ts(first, 12), "ampHours": 25.0 },
            { "date": ts(second, 9), "ampHours": 5.0, "watts": 100.0 }
        ]),
    )
    .await?;

    let response = client
        .get(format!(
            "{base}/api/sensors/daily?start={}&stop={}",
            ts(first, 0),
            ts(second, 23)
        ))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let rollup: ListResponse = response.json().await?;
    assert!(rollup.success);
    assert_eq!(rollup.count, 2, "one row per distinct day");

    // Newest day first; daily dates are bare YYYY-MM-DD
    assert_eq!(rollup.data[0].date, second.to_string());
    assert_eq!(rollup.data[0].amp_hours, Some(5.0));
    assert_eq!(rollup.data[0].watts, Some(100.0));

    assert_eq!(rollup.data[1].date, first.to_string());
    assert_eq!(rollup.data[1].amp_hours, Some(25.0));
    // watts never reported on the first day: MAX over nothing is null
    assert_eq!(rollup.data[1].watts, None);
    // inverterOn was never sent, stored as 0, reads back as false
    assert!(!rollup.data[1].inverter_on);

    Ok(())
}
