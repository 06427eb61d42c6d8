//! Library surface of the CabinPi backend API.
//!
//! The modules mirror the service's layers:
//! - [`config`] – environment-sourced, immutable runtime configuration
//! - [`models`] – the single-declaration telemetry schema and its
//!   ingest/row/response representations
//! - [`schema`] – Postgres DDL bootstrap and the shared SQL text builders
//! - [`routes`] – the Axum route gateway (EMBP: one subrouter per endpoint
//!   family, merged in `routes::router`)
//!
//! The binary in `main.rs` wires these together; integration tests build
//! the same router in-process.

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;

pub use config::Config;

// Re-exported so routes/*.rs depend only on the crate root, not on module
// paths; refactoring the model layer then leaves the routes untouched.
pub use models::{
    Channels, DailyReading, DailyRow, MeasurementRow, SensorReading, SensorRecord,
};
