//! Configuration loaded from layered dotenv files and environment variables
//!
//! Every key is read as `COMPANIES_HOUSE_<KEY>`. Values already present in the
//! process environment win over `.secrets.env`, which wins over `.env`.

use crate::error::{Error, Result};
use crate::warehouse::auth::application_default_credentials;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_PREFIX: &str = "COMPANIES_HOUSE_";

pub const DEFAULT_API_BASE_URL: &str = "https://api.company-information.service.gov.uk";
pub const DEFAULT_BQ_API_ROOT: &str = "https://bigquery.googleapis.com";
pub const DEFAULT_SIC_CODES_URL: &str = "https://www.ons.gov.uk/file?uri=/methodology/classificationsandstandards/ukstandardindustrialclassificationofeconomicactivities/uksic2007/publisheduksicsummaryofstructureworksheet.xlsx";
pub const DEFAULT_JOB_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Settings for the Companies House API client
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub base_url: String,
}

/// Settings for the BigQuery loader
#[derive(Debug, Clone)]
pub struct WarehouseSettings {
    pub project: String,
    pub dataset: String,
    pub api_root: String,
    /// Bearer token; takes precedence over any credentials file
    pub access_token: Option<String>,
    /// Application Default Credentials file, see [`crate::warehouse::auth`]
    pub credentials_file: Option<PathBuf>,
    pub poll_interval: Duration,
}

/// Settings for the SIC codes extract
#[derive(Debug, Clone)]
pub struct SicSettings {
    pub sic_codes_url: String,
}

/// Load `.secrets.env` then `.env` from `dir` without overriding existing variables
pub fn load_dotenv_files(dir: &Path) {
    for name in [".secrets.env", ".env"] {
        let path = dir.join(name);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(()) => debug!("Loaded settings from {:?}", path),
                Err(e) => debug!("Skipping {:?}: {}", path, e),
            }
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingSetting(format!("{ENV_PREFIX}{key}")))
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ApiSettings {
    pub fn from_env() -> Result<Self> {
        load_dotenv_files(Path::new("."));
        Self::from_lookup(env_lookup)
    }

    /// Build from a key lookup; keys are given without the prefix
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ApiSettings {
            api_key: required(&lookup, "API_KEY")?,
            base_url: optional(&lookup, "API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }
}

impl WarehouseSettings {
    /// Also picks up Application Default Credentials from the environment
    pub fn from_env() -> Result<Self> {
        load_dotenv_files(Path::new("."));
        let mut settings = Self::from_lookup(env_lookup)?;
        settings.credentials_file = application_default_credentials();
        Ok(settings)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_interval = match optional(&lookup, "JOB_POLL_INTERVAL_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| Error::InvalidSetting {
                    key: format!("{ENV_PREFIX}JOB_POLL_INTERVAL_MS"),
                    reason: e.to_string(),
                })?;
                Duration::from_millis(millis)
            }
            None => DEFAULT_JOB_POLL_INTERVAL,
        };

        Ok(WarehouseSettings {
            project: required(&lookup, "GCP_PROJECT")?,
            dataset: required(&lookup, "BQ_DATASET")?,
            api_root: optional(&lookup, "BQ_API_ROOT")
                .unwrap_or_else(|| DEFAULT_BQ_API_ROOT.to_string()),
            access_token: optional(&lookup, "GCP_ACCESS_TOKEN"),
            credentials_file: None,
            poll_interval,
        })
    }
}

impl SicSettings {
    pub fn from_env() -> Self {
        load_dotenv_files(Path::new("."));
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        SicSettings {
            sic_codes_url: optional(&lookup, "SIC_CODES_URL")
                .unwrap_or_else(|| DEFAULT_SIC_CODES_URL.to_string()),
        }
    }
}
