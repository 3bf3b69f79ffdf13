//! Authenticated fetch helper for the Companies House public data API
//!
//! API reference:
//! https://developer-specs.company-information.service.gov.uk/companies-house-public-data-api/reference

use crate::config::ApiSettings;
use crate::error::Result;
use crate::utils::ensure_success;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Requests allowed per [`RATE_LIMIT_WINDOW_SECS`]; not enforced client-side
pub const RATE_LIMIT_REQUESTS: u32 = 600;
pub const RATE_LIMIT_WINDOW_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct CompaniesHouseClient {
    api_key: String,
    base_url: String,
}

impl CompaniesHouseClient {
    pub fn new(settings: &ApiSettings) -> Self {
        CompaniesHouseClient {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}/{endpoint}` with the API key as basic-auth username.
    ///
    /// Exactly one request is made; the HTTP client (and its connections) is
    /// dropped before returning on every path.
    pub async fn fetch_data(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        info!("Fetching {}", url);
        debug!("Query parameters: {:?}", query);

        let client = Client::builder().build()?;
        let response = client
            .get(&url)
            .basic_auth(&self.api_key, Some(""))
            .query(query)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        debug!("Received {} bytes from {}", body.len(), endpoint);
        Ok(value)
    }
}
