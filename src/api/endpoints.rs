//! Endpoint wrappers mapping domain requests onto [`CompaniesHouseClient::fetch_data`]

use crate::api::client::CompaniesHouseClient;
use crate::api::params::{AdvancedSearchParams, CompanyNumber};
use crate::error::{Error, Result};
use crate::table::Table;
use serde_json::Value;
use tracing::info;

pub const ADVANCED_SEARCH_ENDPOINT: &str = "advanced-search/companies";

impl CompaniesHouseClient {
    /// Raw JSON from the `company/{number}` endpoint
    pub async fn get_company_profile(&self, number: &CompanyNumber) -> Result<Value> {
        let endpoint = format!("company/{}", number);
        self.fetch_data(&endpoint, &[]).await
    }

    /// Company profile as a single-row table
    pub async fn get_company_profile_as_table(&self, number: &CompanyNumber) -> Result<Table> {
        let profile = self.get_company_profile(number).await?;
        Table::from_json_object(&profile)
    }

    /// One page of company summaries; parameters are validated before any request
    pub async fn advanced_search(&self, params: &AdvancedSearchParams) -> Result<Value> {
        let query = params.to_query()?;
        self.fetch_data(ADVANCED_SEARCH_ENDPOINT, &query).await
    }

    /// The page's `items` as table rows
    pub async fn advanced_search_as_table(&self, params: &AdvancedSearchParams) -> Result<Table> {
        let page = self.advanced_search(params).await?;
        let table = search_items_to_table(&page)?;
        info!("Advanced search returned {} companies", table.num_rows());
        Ok(table)
    }
}

/// Missing or null `items` means an empty page
pub fn search_items_to_table(page: &Value) -> Result<Table> {
    match page.get("items") {
        None | Some(Value::Null) => Table::from_json_records(&[]),
        Some(Value::Array(items)) => Table::from_json_records(items),
        Some(other) => Err(Error::UnexpectedShape(format!(
            "`items` should be an array, got {}",
            other
        ))),
    }
}
