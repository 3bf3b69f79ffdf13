//! Access tokens for the BigQuery REST API
//!
//! Resolution order: a configured bearer token, then an Application Default
//! Credentials file, then the GCE metadata server.

use crate::config::WarehouseSettings;
use crate::error::{Error, Result};
use crate::utils::ensure_success;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// GCE/Cloud Run metadata endpoint for the default service account
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// OAuth endpoint used to refresh user credentials
pub const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Pre-issued bearer token, e.g. from `gcloud auth print-access-token`
    Static(String),
    /// Application Default Credentials JSON file
    CredentialsFile(PathBuf),
    MetadataServer { url: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The parts of an ADC file needed for a refresh-token exchange
#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(rename = "type")]
    kind: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    token_uri: Option<String>,
}

/// `$GOOGLE_APPLICATION_CREDENTIALS`, else gcloud's well-known file if present
pub fn application_default_credentials() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CREDENTIALS_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME")?;
    let well_known = Path::new(&home).join(".config/gcloud/application_default_credentials.json");
    well_known.exists().then_some(well_known)
}

fn credentials_error(path: &Path, reason: impl ToString) -> Error {
    Error::InvalidSetting {
        key: CREDENTIALS_ENV_VAR.to_string(),
        reason: format!("{}: {}", path.display(), reason.to_string()),
    }
}

impl TokenSource {
    pub fn from_settings(settings: &WarehouseSettings) -> Self {
        match (&settings.access_token, &settings.credentials_file) {
            (Some(token), _) => TokenSource::Static(token.clone()),
            (None, Some(path)) => TokenSource::CredentialsFile(path.clone()),
            (None, None) => TokenSource::MetadataServer {
                url: METADATA_TOKEN_URL.to_string(),
            },
        }
    }

    pub async fn access_token(&self, client: &Client) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::CredentialsFile(path) => refresh_user_token(client, path).await,
            TokenSource::MetadataServer { url } => {
                debug!("Requesting access token from {}", url);
                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                let token: TokenResponse = ensure_success(response).await?.json().await?;
                Ok(token.access_token)
            }
        }
    }
}

async fn refresh_user_token(client: &Client, path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| credentials_error(path, e))?;
    let credentials: Credentials =
        serde_json::from_str(&raw).map_err(|e| credentials_error(path, e))?;

    if credentials.kind != "authorized_user" {
        return Err(credentials_error(
            path,
            format!(
                "credential type `{}` is not supported; set COMPANIES_HOUSE_GCP_ACCESS_TOKEN instead",
                credentials.kind
            ),
        ));
    }

    let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
        credentials.client_id,
        credentials.client_secret,
        credentials.refresh_token,
    ) else {
        return Err(credentials_error(
            path,
            "authorized_user credentials need client_id, client_secret and refresh_token",
        ));
    };

    let token_uri = credentials
        .token_uri
        .unwrap_or_else(|| OAUTH_TOKEN_URL.to_string());
    debug!("Refreshing user credentials from {:?} via {}", path, token_uri);

    let response = client
        .post(&token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?;
    let token: TokenResponse = ensure_success(response).await?.json().await?;
    Ok(token.access_token)
}
