pub mod job;
pub mod upload;

pub use job::{CreateJobRequest, Job, JobStatus};
pub use upload::{InitUploadRequest, Upload, UploadStatus};

/// Returned when a persisted status string does not match any known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown status value: {0}")]
pub struct StatusParseError(pub String);
