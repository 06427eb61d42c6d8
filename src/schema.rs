//! Database schema management for the CabinPi API.
//!
//! Ensures the `measurements` table and its index exist before serving
//! requests; applied once on startup from `main.rs`. Also the home of the
//! SQL text builders: every statement that names telemetry columns is
//! generated here from [`CHANNEL_COLUMNS`], so the ingest, latest, range,
//! and daily paths can never disagree about the column set.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::CHANNEL_COLUMNS;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the append-only `measurements` table and its `date` index. Safe
/// to call on every startup; no-op if the objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(&create_table_sql()).execute(&mut *tx).await?;

    // Every query path filters or orders by date
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_date
            ON measurements (date);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

// ---

/// All measurement columns in statement order: `date`, the channels, then
/// `inverter_on`. This is the bind order used by the ingest path.
pub fn all_columns() -> Vec<&'static str> {
    // ---
    let mut columns = Vec::with_capacity(CHANNEL_COLUMNS.len() + 2);
    columns.push("date");
    columns.extend_from_slice(CHANNEL_COLUMNS);
    columns.push("inverter_on");
    columns
}

/// DDL for the `measurements` table.
///
/// `date` is NOT NULL but deliberately not unique: producers may emit
/// several readings inside one interval and all of them persist. Channels
/// are nullable doubles; `inverter_on` is the 0/1 stored boolean.
fn create_table_sql() -> String {
    // ---
    let channel_defs: Vec<String> = CHANNEL_COLUMNS
        .iter()
        .map(|column| format!("    {column} DOUBLE PRECISION,"))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS measurements (\n    \
         date TIMESTAMP NOT NULL,\n\
         {}\n    \
         inverter_on INTEGER\n\
         );",
        channel_defs.join("\n")
    )
}

/// `INSERT INTO measurements (...) VALUES ($1, ..., $33)`, one placeholder
/// per column of [`all_columns`].
pub fn insert_sql() -> String {
    // ---
    let columns = all_columns();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();

    format!(
        "INSERT INTO measurements ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `SELECT <every column> FROM measurements`, for the latest and range
/// queries to extend with their WHERE/ORDER BY/LIMIT clauses.
pub fn select_sql() -> String {
    // ---
    format!("SELECT {} FROM measurements", all_columns().join(", "))
}

/// The daily rollup: bucket rows by calendar day and take the per-column
/// MAX over `[$1, $2]`, newest day first.
///
/// MAX ignores NULLs, so a channel that never reported that day stays NULL.
/// For enum-like channels (`inverter_fault`, `battery_state`, ...) the MAX
/// is just the numerically largest code seen that day; the dashboard knows.
pub fn daily_select_sql() -> String {
    // ---
    let mut selects = Vec::with_capacity(CHANNEL_COLUMNS.len() + 2);
    selects.push("CAST(date AS DATE) AS date".to_string());
    selects.extend(
        CHANNEL_COLUMNS
            .iter()
            .map(|column| format!("MAX({column}) AS {column}")),
    );
    selects.push("MAX(inverter_on) AS inverter_on".to_string());

    format!(
        "SELECT {} FROM measurements \
         WHERE date >= $1 AND date <= $2 \
         GROUP BY CAST(date AS DATE) \
         ORDER BY date DESC",
        selects.join(", ")
    )
}
