use thiserror::Error;

/// Enhancement provider errors.
///
/// These stay inside the job orchestration layer. A submit failure becomes
/// the job's recorded error message rather than an HTTP error response.
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider API token not configured")]
    NotConfigured,
}
