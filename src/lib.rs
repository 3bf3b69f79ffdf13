//! Companies House API client and SIC code ETL into BigQuery

pub mod api;
pub mod config;
pub mod error;
pub mod sic;
pub mod table;
pub mod utils;
pub mod warehouse;

pub use api::{AdvancedSearchParams, CompaniesHouseClient, CompanyNumber};
pub use config::{ApiSettings, SicSettings, WarehouseSettings};
pub use error::{Error, Result};
pub use table::Table;
pub use warehouse::{BigQueryLoader, LoadJobOutcome, WriteDisposition};

/// Install the `tracing` subscriber used by the binaries
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();
}
