//! Error type shared by every operation in the crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, TLS or body-read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any non-2xx response
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("missing setting {0}")]
    MissingSetting(String),

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("worksheet has no `{0}` column")]
    MissingColumn(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// BigQuery finished the job with an `errorResult`
    #[error("load job {job_id} failed ({reason}): {message}")]
    LoadJob {
        job_id: String,
        reason: String,
        message: String,
    },
}

impl Error {
    /// HTTP status carried by a [`Error::Status`], if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
