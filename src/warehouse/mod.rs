//! Warehouse loader - Parquet serialization and BigQuery load jobs

pub mod auth;
pub mod job;
pub mod write;

pub use job::{BigQueryLoader, LoadJobOutcome, WriteDisposition};
pub use write::to_parquet_bytes;
