//! SIC (Standard Industrial Classification) codes - fetch, parse, transform, load
//!
//! The ONS publishes the UK SIC 2007 summary of structure as a workbook. Its
//! rows are reshaped into one row per class with the section, division and
//! group nested as `{code, description}` structs, then loaded to BigQuery.

pub mod arrow;
pub mod fetch;
pub mod parse;
pub mod transform;
pub mod types;

pub use types::*;

use crate::error::Result;
use crate::table::Table;
use crate::warehouse::{BigQueryLoader, LoadJobOutcome, WriteDisposition};
use calamine::{Data, Range};
use tracing::info;

pub const DEFAULT_TABLE_NAME: &str = "sic_codes";

/// Parse and reshape workbook bytes into the hierarchy table
pub fn transform_workbook(bytes: Vec<u8>) -> Result<Table> {
    let range = parse::read_first_sheet(bytes)?;
    transform_sheet(&range)
}

/// Reshape an already loaded worksheet into the hierarchy table
pub fn transform_sheet(range: &Range<Data>) -> Result<Table> {
    let rows = parse::parse_sheet(range)?;
    let classes = transform::build_hierarchy(&rows);
    arrow::classes_to_table(&classes)
}

/// Download the workbook from `url` and return the hierarchy table
pub async fn load_sic_codes(url: &str) -> Result<Table> {
    let bytes = fetch::fetch_sic_workbook(url).await?;
    transform_workbook(bytes)
}

/// Download, transform and replace `table_name` in the configured dataset
pub async fn load_sic_codes_to_bigquery(
    loader: &BigQueryLoader,
    url: &str,
    table_name: &str,
) -> Result<LoadJobOutcome> {
    info!("=== SIC codes pipeline ===");

    info!("Step 1/2: Fetching and transforming...");
    let table = load_sic_codes(url).await?;
    info!("✓ {} classes ready", table.num_rows());

    info!("Step 2/2: Loading to BigQuery...");
    let outcome = loader
        .save_table(&table, table_name, WriteDisposition::Truncate)
        .await?;
    info!("✓ Loaded into {}", outcome.destination);

    Ok(outcome)
}
