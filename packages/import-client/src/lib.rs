//! Pure REST API client for the salon data-import job service.
//!
//! Supports submitting an import file, polling job status, and listing or
//! deleting previously submitted jobs. The remote service owns the job queue;
//! this client is a thin, stateless proxy over it — one request per call, no
//! internal retry, no polling cadence of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use import_client::{ImportClient, Provider};
//!
//! let client = ImportClient::new("https://api.example.com", Provider::Zapisikz, token);
//!
//! let job = client.upload_path("report.xlsx", Some("5")).await?;
//! loop {
//!     let job = client.status(&job.job_id).await?;
//!     if job.status.is_terminal() {
//!         break;
//!     }
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{ErrorKind, ImportError, Result};
pub use types::{Envelope, ImportJob, ImportStats, JobList, JobStatus, Provider};

use std::path::Path;

use serde::de::DeserializeOwned;
use types::ApiBody;

/// Client for the `/api/import/<provider>` endpoints.
///
/// Cheap to clone; each call is an independent request/response exchange and
/// may be issued concurrently for different job ids.
#[derive(Debug, Clone)]
pub struct ImportClient {
    client: reqwest::Client,
    base_url: String,
    provider: Provider,
    token: String,
}

impl ImportClient {
    /// An absent token is passed as an empty string: the bearer header is
    /// still sent (empty) and the server rejects the request, rather than the
    /// header being omitted.
    pub fn new(base_url: impl Into<String>, provider: Provider, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            provider,
            token: token.into(),
        }
    }

    fn endpoint(&self, rest: &str) -> String {
        format!("{}/api/import/{}/{}", self.base_url, self.provider, rest)
    }

    /// Submit a file for import. Returns as soon as the server accepts the
    /// job — processing continues asynchronously; poll with [`status`].
    ///
    /// [`status`]: ImportClient::status
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        branch_id: Option<&str>,
    ) -> Result<ImportJob> {
        if bytes.is_empty() {
            return Err(ImportError::InvalidInput {
                kind: ErrorKind::UploadError,
                message: format!("file '{file_name}' is empty"),
            });
        }

        tracing::info!(file_name, ?branch_id, "Submitting import file");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(branch) = branch_id {
            form = form.text("branchId", branch.to_string());
        }

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ImportError::Transport {
                kind: ErrorKind::UploadError,
                source,
            })?;

        let job: ImportJob = decode(resp, ErrorKind::UploadError).await?;
        tracing::info!(job_id = %job.job_id, status = %job.status, "Import job accepted");
        Ok(job)
    }

    /// Read a local file and submit it; the server sees the file's base name.
    pub async fn upload_path(
        &self,
        path: impl AsRef<Path>,
        branch_id: Option<&str>,
    ) -> Result<ImportJob> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ImportError::Io {
                kind: ErrorKind::UploadError,
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import.dat".to_string());
        self.upload(&file_name, bytes, branch_id).await
    }

    /// One status query for a job. Single-shot and stateless: interval,
    /// backoff, and give-up policy belong to the caller.
    pub async fn status(&self, job_id: &str) -> Result<ImportJob> {
        let resp = self
            .client
            .get(self.endpoint(&format!("status/{job_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ImportError::Transport {
                kind: ErrorKind::FetchError,
                source,
            })?;

        let job: ImportJob = decode(resp, ErrorKind::FetchError).await?;
        tracing::debug!(job_id = %job.job_id, status = %job.status, "Polled import job");
        Ok(job)
    }

    /// List previously submitted jobs, in the server's order.
    pub async fn list_jobs(&self) -> Result<JobList> {
        let resp = self
            .client
            .get(self.endpoint("jobs"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ImportError::Transport {
                kind: ErrorKind::FetchError,
                source,
            })?;

        let list: JobList = decode(resp, ErrorKind::FetchError).await?;
        tracing::debug!(total_jobs = list.total_jobs, "Fetched import job list");
        Ok(list)
    }

    /// Request removal of a job. Returns the server's confirmation message.
    /// Whether deleting an unknown id succeeds is the server's decision.
    pub async fn delete_job(&self, job_id: &str) -> Result<String> {
        let resp = self
            .client
            .delete(self.endpoint(&format!("jobs/{job_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ImportError::Transport {
                kind: ErrorKind::DeleteError,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ImportError::Api {
                kind: ErrorKind::DeleteError,
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(|source| ImportError::Transport {
            kind: ErrorKind::DeleteError,
            source,
        })?;
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|source| ImportError::Malformed {
                kind: ErrorKind::DeleteError,
                source,
            })?;

        if env.success {
            tracing::info!(job_id, "Import job deleted");
            Ok(env.message.unwrap_or_else(|| "job deleted".to_string()))
        } else {
            let message = env
                .error
                .or(env.message)
                .unwrap_or_else(|| "remote service reported failure".to_string());
            Err(ImportError::Rejected {
                kind: ErrorKind::DeleteError,
                message,
            })
        }
    }
}

/// Check HTTP status, then normalize the bare-or-wrapped body into `T`.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response, kind: ErrorKind) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ImportError::Api {
            kind,
            status: status.as_u16(),
            message,
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|source| ImportError::Transport { kind, source })?;
    let parsed: ApiBody<T> =
        serde_json::from_str(&body).map_err(|source| ImportError::Malformed { kind, source })?;
    parsed.normalize(kind)
}
