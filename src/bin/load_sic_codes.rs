//! Extract SIC codes from the ONS workbook and load them to BigQuery
//!
//! Usage: load-sic-codes [TABLE_NAME]

use anyhow::{Context, Result};
use companies_house::sic::{load_sic_codes_to_bigquery, DEFAULT_TABLE_NAME};
use companies_house::{init_logging, BigQueryLoader, SicSettings, WarehouseSettings};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting SIC codes load");

    let settings = WarehouseSettings::from_env().context("loading warehouse settings")?;
    let sic = SicSettings::from_env();
    let table_name = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());

    let loader = BigQueryLoader::new(&settings);

    match load_sic_codes_to_bigquery(&loader, &sic.sic_codes_url, &table_name).await {
        Ok(outcome) => {
            info!(
                "✓ {} completed: job {} ({:?} rows)",
                outcome.destination, outcome.job_id, outcome.output_rows
            );
            Ok(())
        }
        Err(e) => {
            error!("✗ SIC codes load failed: {}", e);
            Err(e.into())
        }
    }
}
