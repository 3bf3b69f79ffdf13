//! Fetch the published SIC summary-of-structure workbook

use crate::error::Result;
use crate::utils::http_get;
use tracing::info;

/// Download the workbook bytes; single attempt, nothing cached
pub async fn fetch_sic_workbook(url: &str) -> Result<Vec<u8>> {
    info!("Fetching SIC codes workbook from {}", url);
    http_get(url).await
}
