//! Enhancement provider abstraction.

use crate::catalog::EnhanceModel;
use crate::error::EnhanceError;
use async_trait::async_trait;
use bytes::Bytes;

/// Observed state of a provider-side prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Still working. Progress is a percentage when the provider reports one.
    Running { progress: Option<f64> },
    /// Finished with a fetchable artifact URL.
    Succeeded { result_url: String },
    /// Finished unsuccessfully.
    Failed { error: String },
}

/// Provider abstraction for AI video enhancement.
///
/// Implementations wrap a remote inference API. The source video is passed
/// by URL, so it must be reachable from the provider's side.
#[async_trait]
pub trait EnhanceProvider: Send + Sync {
    /// Submit a new prediction for the video at `source_url`.
    ///
    /// Returns the provider-side prediction id used for later polling.
    async fn submit(&self, source_url: &str, model: &EnhanceModel)
        -> Result<String, EnhanceError>;

    /// Check the state of a previously submitted prediction.
    async fn poll(&self, provider_id: &str) -> Result<PollOutcome, EnhanceError>;

    /// Download the finished artifact.
    async fn fetch_result(&self, result_url: &str) -> Result<Bytes, EnhanceError>;

    /// Whether the provider has credentials to accept submissions.
    fn configured(&self) -> bool;
}
