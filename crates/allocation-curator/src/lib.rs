//! Data curation core for client/worker/task allocation datasets.
//!
//! The [`curation`] module holds the pure engines (validation, readiness,
//! business rules, bulk modification, search). [`ingest`] and [`export`] are the
//! file boundaries that produce and consume the entity records.

pub mod config;
pub mod curation;
pub mod error;
pub mod export;
pub mod ingest;
pub mod telemetry;
