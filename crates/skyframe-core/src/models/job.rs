use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::StatusParseError;

/// Lifecycle of an enhancement job.
///
/// `pending -> submitted -> processing -> completed`, with `failed` reachable
/// from any non-terminal state. `completed` and `failed` accept no further
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Submitted => "submitted",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl FromStr for JobStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "submitted" => Ok(JobStatus::Submitted),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// One enhancement request against a completed upload, tracked through
/// submission to the external inference provider.
///
/// Field invariants: `provider_id` is set once the provider accepts the
/// submission (a job that failed before acceptance has none); `result_key`
/// is set exactly when `status` is `completed`; `error_message` is set
/// exactly when `status` is `failed`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub upload_id: Uuid,
    /// Catalogue key of the selected model
    pub model_key: String,
    pub status: JobStatus,
    /// Provider-side job handle, used for polling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Provider-reported progress percentage, best effort
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    /// Byte size of the persisted result artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Fresh job awaiting background submission.
    pub fn pending(upload_id: Uuid, model_key: String) -> Self {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            upload_id,
            model_key,
            status: JobStatus::Pending,
            provider_id: None,
            progress: None,
            result_key: None,
            result_size: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Request to create an enhancement job
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateJobRequest {
    /// Id of a completed upload
    pub upload_id: Uuid,
    /// Catalogue key of the model to run; the configured default when omitted
    #[validate(length(
        min = 1,
        max = 64,
        message = "Model key must be between 1 and 64 characters"
    ))]
    pub model: Option<String>,
}
