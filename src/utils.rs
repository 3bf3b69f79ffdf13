//! Utility functions for common HTTP operations

use crate::error::{Error, Result};
use reqwest::{Client, Response};
use tracing::{debug, info};

/// Turn a non-2xx response into [`Error::Status`], keeping the body for context
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("HTTP request failed with {}: {}", status, body);
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}

/// Download a file via HTTP
pub async fn http_get(url: &str) -> Result<Vec<u8>> {
    info!("Downloading from {}", url);
    let client = Client::builder().build()?;

    let response = client.get(url).send().await?;
    let response = ensure_success(response).await?;

    let bytes = response.bytes().await?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
