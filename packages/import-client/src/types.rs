use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ImportError, Result};

/// Remote data-import provider. Both expose the same endpoints under
/// `/api/import/<provider>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Dikidi,
    Zapisikz,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Dikidi => "dikidi",
            Provider::Zapisikz => "zapisikz",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dikidi" => Ok(Provider::Dikidi),
            "zapisikz" => Ok(Provider::Zapisikz),
            other => Err(format!("unknown provider '{other}' (expected dikidi or zapisikz)")),
        }
    }
}

/// Lifecycle state of an import job, owned by the remote service.
///
/// Transitions are forward-only: `pending → processing → {completed, failed}`.
/// The client never writes status; it only observes it through polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether the remote service may legally move a job from `self` to
    /// `next`. Skipping forward is allowed (a poll can miss `processing`);
    /// moving backwards or out of a terminal state is not.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result counters reported by the remote service once a job reaches a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportStats {
    pub bookings_created: u64,
    pub clients_created: u64,
    pub services_created: u64,
    pub skipped: u64,
    pub duplicates: u64,
    pub errors: Vec<String>,
}

/// A server-side asynchronous import job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    /// Opaque id assigned at submission; never reused.
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Tenant/location scoping key.
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Populated once, at the terminal transition.
    #[serde(default)]
    pub stats: Option<ImportStats>,
}

/// Listing of previously submitted jobs, in whatever order the remote
/// service returns them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList {
    pub total_jobs: u64,
    pub jobs: Vec<ImportJob>,
}

/// Wrapped response envelope the remote service sometimes uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Union of the two shapes the remote service answers with: a bare payload
/// or an [`Envelope`] around one. Normalized exactly once, at the boundary;
/// downstream code only ever sees the normalized result.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiBody<T> {
    Wrapped(Envelope<T>),
    Bare(T),
}

impl<T> ApiBody<T> {
    pub(crate) fn normalize(self, kind: ErrorKind) -> Result<T> {
        match self {
            ApiBody::Bare(value) => Ok(value),
            ApiBody::Wrapped(env) if env.success => env.data.ok_or_else(|| ImportError::Rejected {
                kind,
                message: "success envelope without data".to_string(),
            }),
            ApiBody::Wrapped(env) => {
                let message = env
                    .error
                    .or(env.message)
                    .unwrap_or_else(|| "remote service reported failure".to_string());
                let message = match env.code {
                    Some(code) => format!("{code}: {message}"),
                    None => message,
                };
                Err(ImportError::Rejected { kind, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_forward_only() {
        use JobStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        // No way back.
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Pending));
        // Terminal states are final, even towards other terminal states.
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, JobStatus::Failed);
    }

    #[test]
    fn bare_and_wrapped_payloads_normalize_identically() {
        let bare = r#"{"jobId":"x","status":"pending"}"#;
        let wrapped = r#"{"success":true,"data":{"jobId":"x","status":"pending"}}"#;

        let from_bare: ApiBody<ImportJob> = serde_json::from_str(bare).unwrap();
        let from_wrapped: ApiBody<ImportJob> = serde_json::from_str(wrapped).unwrap();

        let a = from_bare.normalize(ErrorKind::FetchError).unwrap();
        let b = from_wrapped.normalize(ErrorKind::FetchError).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.job_id, "x");
        assert_eq!(a.status, JobStatus::Pending);
    }

    #[test]
    fn failure_envelope_becomes_rejected_error() {
        let body = r#"{"success":false,"error":"branch not found","code":"UPLOAD_ERROR"}"#;
        let parsed: ApiBody<ImportJob> = serde_json::from_str(body).unwrap();
        let err = parsed.normalize(ErrorKind::UploadError).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UploadError);
        assert!(err.to_string().contains("branch not found"));
    }

    #[test]
    fn terminal_job_carries_stats() {
        let body = r#"{
            "jobId": "abc123",
            "status": "completed",
            "fileName": "report.xlsx",
            "branchId": "5",
            "startTime": "2026-08-01T10:00:00Z",
            "endTime": "2026-08-01T10:02:30Z",
            "stats": {
                "bookingsCreated": 42,
                "clientsCreated": 7,
                "skipped": 3,
                "duplicates": 1,
                "errors": ["row 19: unknown service"]
            }
        }"#;

        let job: ImportJob = serde_json::from_str(body).unwrap();
        assert!(job.status.is_terminal());
        let stats = job.stats.unwrap();
        assert_eq!(stats.bookings_created, 42);
        assert_eq!(stats.services_created, 0);
        assert_eq!(stats.errors.len(), 1);
    }
}
