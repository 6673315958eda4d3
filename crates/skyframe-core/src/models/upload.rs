use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::StatusParseError;

/// Lifecycle of an upload slot: reserved -> uploading -> complete | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Reserved,
    Uploading,
    Complete,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Reserved => "reserved",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Complete => "complete",
            UploadStatus::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Failed)
    }
}

impl FromStr for UploadStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(UploadStatus::Reserved),
            "uploading" => Ok(UploadStatus::Uploading),
            "complete" => Ok(UploadStatus::Complete),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// A user-submitted source video and its lifecycle record.
///
/// `storage_key` is set exactly when `status` is `complete`; until then the
/// bytes may exist in the blob store but are not considered durable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Upload {
    pub id: Uuid,
    /// Original filename as declared by the client
    pub filename: String,
    /// Declared content type (MIME type)
    pub content_type: String,
    /// Declared content size in bytes, verified at completion
    pub size_bytes: i64,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Upload {
    /// Fresh reservation with no bytes written yet.
    pub fn reserve(filename: String, content_type: String, size_bytes: i64) -> Self {
        let now = Utc::now();
        Upload {
            id: Uuid::new_v4(),
            filename,
            content_type,
            size_bytes,
            status: UploadStatus::Reserved,
            storage_key: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request to reserve an upload slot
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InitUploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Declared file size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size_bytes: i64,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
}
