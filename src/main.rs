//! Smoke test for the Companies House endpoints
//!
//! Usage: companies-house [COMPANY_NUMBER] [INCORPORATED_FROM INCORPORATED_TO]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use companies_house::{
    init_logging, AdvancedSearchParams, ApiSettings, CompaniesHouseClient, CompanyNumber,
};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let settings = ApiSettings::from_env().context("loading API settings")?;
    let client = CompaniesHouseClient::new(&settings);
    info!("Using Companies House API at {}", client.base_url());

    let args: Vec<String> = env::args().skip(1).collect();
    let number = CompanyNumber::parse(args.first().map(String::as_str).unwrap_or("00000006"))?;
    let incorporated_from = parse_date(args.get(1).map(String::as_str).unwrap_or("2024-05-06"))?;
    let incorporated_to = parse_date(args.get(2).map(String::as_str).unwrap_or("2024-06-05"))?;

    match client.get_company_profile_as_table(&number).await {
        Ok(table) => {
            info!(
                "✓ Company {}: {} columns",
                number,
                table.num_columns()
            );
            println!("{:#?}", table.batch());
        }
        Err(e) => error!("✗ Company profile {} failed: {}", number, e),
    }

    let params = AdvancedSearchParams {
        incorporated_from: Some(incorporated_from),
        incorporated_to: Some(incorporated_to),
        ..Default::default()
    };
    match client.advanced_search_as_table(&params).await {
        Ok(table) => {
            info!(
                "✓ Advanced search {}..{}: {} companies",
                incorporated_from,
                incorporated_to,
                table.num_rows()
            );
            println!("{:#?}", table.batch());
        }
        Err(e) => error!("✗ Advanced search failed: {}", e),
    }

    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date {:?}", raw))
}
