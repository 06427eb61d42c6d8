//! Data models for the CabinPi measurement pipeline.
//!
//! The telemetry column set is declared exactly once, in the [`channels!`]
//! invocation below. The macro expands into the [`Channels`] struct, the
//! [`CHANNEL_COLUMNS`] name list, and the bind-order helper, so the insert,
//! latest, range, and daily query paths all consume the same declaration.
//! Adding a telemetry field is a one-line change here plus nothing else.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

// ---

/// Declare the nullable telemetry channels: struct fields, column names,
/// and bind order all come from this single list.
///
/// Field names are the snake_case Postgres column names; the wire format is
/// camelCase via `rename_all`, matching what the sensor producers send.
macro_rules! channels {
    ($($field:ident),+ $(,)?) => {
        /// The nullable numeric telemetry channels of one measurement.
        ///
        /// Shared by ingest input, stored rows, and query responses; `None`
        /// maps to SQL NULL and JSON null in all three.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
        #[serde(rename_all = "camelCase")]
        pub struct Channels {
            $(pub $field: Option<f64>,)+
        }

        /// Channel column names in declaration order.
        ///
        /// This order is the bind order of [`Channels::bind_all`]; SQL built
        /// from this list stays consistent with the struct by construction.
        pub const CHANNEL_COLUMNS: &[&str] = &[$(stringify!($field)),+];

        impl Channels {
            /// Bind every channel value onto `query`, in [`CHANNEL_COLUMNS`] order.
            pub fn bind_all<'q>(
                &self,
                query: Query<'q, Postgres, PgArguments>,
            ) -> Query<'q, Postgres, PgArguments> {
                // ---
                query $(.bind(self.$field))+
            }
        }
    };
}

channels! {
    amp_hours,
    avg_strike_distance,
    battery_state,
    charge_state,
    classic_state,
    daily_accumulation,
    dispavg_vbatt,
    dispavg_vpv,
    ext_f,
    ext_humidity,
    humidity,
    ibatt_display,
    illuminance,
    in_hg,
    int_f,
    inverter_aac_out,
    inverter_fault,
    inverter_mode,
    inverter_vac_out,
    kwhours,
    nite_minutes_no_pwr,
    pv_input_current,
    rain,
    solar_radiation,
    strike_count,
    uv,
    voc_last_measured,
    watts,
    wind_avg,
    wind_direction,
    wind_gust,
}

// ---

/// One candidate reading from an ingest batch, as sent by a producer.
///
/// `date` is optional here: a record without one is skipped rather than
/// failing the batch. `inverter_on` lives outside [`Channels`] because it is
/// the one logical boolean in the schema (stored as INTEGER 0/1).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    // ---
    pub date: Option<NaiveDateTime>,

    #[serde(flatten)]
    pub channels: Channels,

    pub inverter_on: Option<bool>,
}

impl SensorRecord {
    /// Apply the inverter consistency rule before storage.
    ///
    /// A faulted or off inverter cannot report valid AC output: when
    /// `inverter_fault > 0` or `inverter_on` is false/absent, the AC output
    /// channels are cleared and `inverter_on` is forced to false.
    pub fn normalized(mut self) -> Self {
        // ---
        let faulted = self.channels.inverter_fault.is_some_and(|f| f > 0.0);

        if faulted || !self.inverter_on.unwrap_or(false) {
            self.channels.inverter_aac_out = None;
            self.channels.inverter_vac_out = None;
            self.inverter_on = Some(false);
        }

        self
    }

    /// Storage form of `inverter_on`: 1 for true, 0 otherwise.
    pub fn inverter_on_stored(&self) -> i32 {
        // ---
        if self.inverter_on == Some(true) {
            1
        } else {
            0
        }
    }
}

// ---

/// A stored measurement as fetched from Postgres.
#[derive(Debug, sqlx::FromRow)]
pub struct MeasurementRow {
    // ---
    pub date: NaiveDateTime,

    #[sqlx(flatten)]
    pub channels: Channels,

    pub inverter_on: Option<i32>,
}

/// One calendar day of MAX-aggregated measurements as fetched from Postgres.
#[derive(Debug, sqlx::FromRow)]
pub struct DailyRow {
    // ---
    pub date: NaiveDate,

    #[sqlx(flatten)]
    pub channels: Channels,

    pub inverter_on: Option<i32>,
}

/// A measurement in API-response form, with `inverter_on` decoded to bool.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    // ---
    pub date: NaiveDateTime,

    #[serde(flatten)]
    pub channels: Channels,

    pub inverter_on: bool,
}

/// A daily aggregate in API-response form; `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReading {
    // ---
    pub date: NaiveDate,

    #[serde(flatten)]
    pub channels: Channels,

    pub inverter_on: bool,
}

impl From<MeasurementRow> for SensorReading {
    fn from(row: MeasurementRow) -> Self {
        // Stored 1 means on; 0, NULL, or anything unexpected reads as off.
        SensorReading {
            date: row.date,
            channels: row.channels,
            inverter_on: row.inverter_on == Some(1),
        }
    }
}

impl From<DailyRow> for DailyReading {
    fn from(row: DailyRow) -> Self {
        DailyReading {
            date: row.date,
            channels: row.channels,
            inverter_on: row.inverter_on == Some(1),
        }
    }
}
