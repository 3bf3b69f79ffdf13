//! BigQuery load jobs over the REST API: submit one multipart upload, wait for DONE

use crate::config::WarehouseSettings;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::utils::ensure_success;
use crate::warehouse::auth::TokenSource;
use crate::warehouse::write::to_parquet_bytes;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const JOB_ID_PREFIX: &str = "companies_house_load_";
const DONE: &str = "DONE";

/// What happens to rows already in the destination table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum WriteDisposition {
    #[default]
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
    #[serde(rename = "WRITE_APPEND")]
    Append,
}

impl WriteDisposition {
    pub fn from_replace(replace: bool) -> Self {
        if replace {
            WriteDisposition::Truncate
        } else {
            WriteDisposition::Append
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration {
    pub destination_table: TableReference,
    pub source_format: &'static str,
    pub write_disposition: WriteDisposition,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobConfiguration {
    pub load: LoadConfiguration,
}

/// Body of the `jobs.insert` metadata part
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadJobRequest {
    pub job_reference: JobReference,
    pub configuration: JobConfiguration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub state: String,
    pub error_result: Option<ErrorProto>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatistics {
    pub output_rows: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatistics {
    pub load: Option<LoadStatistics>,
}

/// The subset of the BigQuery job resource this crate reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResource {
    pub job_reference: JobReference,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub statistics: Option<JobStatistics>,
}

impl JobResource {
    pub fn is_done(&self) -> bool {
        self.status.state == DONE
    }

    fn output_rows(&self) -> Option<u64> {
        self.statistics
            .as_ref()
            .and_then(|s| s.load.as_ref())
            .and_then(|l| l.output_rows.as_deref())
            .and_then(|rows| rows.parse().ok())
    }

    /// `Err` when the finished job carries an `errorResult`
    fn into_result(self) -> Result<Self> {
        let Some(error) = self.status.error_result.clone() else {
            return Ok(self);
        };

        let mut message = error.message.clone();
        let details: Vec<&str> = self
            .status
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty() && *m != error.message)
            .collect();
        if !details.is_empty() {
            message = format!("{} ({})", message, details.join("; "));
        }

        Err(Error::LoadJob {
            job_id: self.job_reference.job_id.clone(),
            reason: error.reason.clone(),
            message,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJobOutcome {
    pub job_id: String,
    /// `project.dataset.table`
    pub destination: String,
    pub output_rows: Option<u64>,
}

/// Loads tables into `{project}.{dataset}.{table}` via Parquet load jobs
#[derive(Debug, Clone)]
pub struct BigQueryLoader {
    project: String,
    dataset: String,
    api_root: String,
    token_source: TokenSource,
    poll_interval: Duration,
}

impl BigQueryLoader {
    pub fn new(settings: &WarehouseSettings) -> Self {
        BigQueryLoader {
            project: settings.project.clone(),
            dataset: settings.dataset.clone(),
            api_root: settings.api_root.trim_end_matches('/').to_string(),
            token_source: TokenSource::from_settings(settings),
            poll_interval: settings.poll_interval,
        }
    }

    /// `{dataset}.{table_name}`
    pub fn table_id(&self, table_name: &str) -> String {
        format!("{}.{}", self.dataset, table_name)
    }

    pub fn load_request(&self, table_name: &str, disposition: WriteDisposition) -> LoadJobRequest {
        LoadJobRequest {
            job_reference: JobReference {
                project_id: self.project.clone(),
                job_id: format!("{}{}", JOB_ID_PREFIX, Uuid::new_v4().simple()),
                location: None,
            },
            configuration: JobConfiguration {
                load: LoadConfiguration {
                    destination_table: TableReference {
                        project_id: self.project.clone(),
                        dataset_id: self.dataset.clone(),
                        table_id: table_name.to_string(),
                    },
                    source_format: "PARQUET",
                    write_disposition: disposition,
                },
            },
        }
    }

    /// Replace the contents of `table_name` with `table`
    pub async fn save_table_replace(&self, table: &Table, table_name: &str) -> Result<LoadJobOutcome> {
        self.save_table(table, table_name, WriteDisposition::Truncate).await
    }

    /// Serialize `table` to Parquet in memory, submit one load job and block
    /// until BigQuery reports it done.
    ///
    /// A failed job is returned as [`Error::LoadJob`]; it is never resubmitted.
    pub async fn save_table(
        &self,
        table: &Table,
        table_name: &str,
        disposition: WriteDisposition,
    ) -> Result<LoadJobOutcome> {
        validate_table_name(table_name)?;

        let destination = format!("{}.{}", self.project, self.table_id(table_name));
        info!(
            "Loading {} rows into {} ({:?})",
            table.num_rows(),
            destination,
            disposition
        );

        let parquet = to_parquet_bytes(table)?;
        let request = self.load_request(table_name, disposition);

        let client = Client::builder().build()?;
        let token = self.token_source.access_token(&client).await?;

        let job = self.insert_job(&client, &token, &request, parquet).await?;
        info!("Submitted load job {}", job.job_reference.job_id);

        let job = self.wait_for_job(&client, &token, job).await?.into_result()?;

        let outcome = LoadJobOutcome {
            job_id: job.job_reference.job_id.clone(),
            destination,
            output_rows: job.output_rows(),
        };
        info!(
            "Load job {} complete ({:?} rows)",
            outcome.job_id, outcome.output_rows
        );
        Ok(outcome)
    }

    async fn insert_job(
        &self,
        client: &Client,
        token: &str,
        request: &LoadJobRequest,
        parquet: Vec<u8>,
    ) -> Result<JobResource> {
        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs",
            self.api_root, self.project
        );
        let boundary = format!("load_{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &serde_json::to_vec(request)?, &parquet);

        let response = client
            .post(&url)
            .query(&[("uploadType", "multipart")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        let body = ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn wait_for_job(
        &self,
        client: &Client,
        token: &str,
        mut job: JobResource,
    ) -> Result<JobResource> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.api_root, self.project, job.job_reference.job_id
        );

        while !job.is_done() {
            debug!(
                "Job {} is {}; checking again in {:?}",
                job.job_reference.job_id, job.status.state, self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;

            let mut get = client.get(&url).bearer_auth(token);
            if let Some(location) = &job.job_reference.location {
                get = get.query(&[("location", location.as_str())]);
            }
            let body = ensure_success(get.send().await?).await?.text().await?;
            job = serde_json::from_str(&body)?;
        }

        if job.status.error_result.is_some() {
            warn!("Load job {} finished with errors", job.job_reference.job_id);
        }
        Ok(job)
    }
}

/// Letters, digits, `_` and `-`
pub fn validate_table_name(table_name: &str) -> Result<()> {
    let valid = !table_name.is_empty()
        && table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!(
            "invalid table name {:?}",
            table_name
        )))
    }
}

/// `multipart/related` body: JSON metadata part then the Parquet media part
pub fn multipart_related_body(boundary: &str, metadata: &[u8], media: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(metadata.len() + media.len() + 256);

    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata);
    body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.put_slice(media);
    body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    body.freeze()
}
