//! SkyFrame Enhancement Library
//!
//! This crate provides the AI enhancement provider abstraction and the
//! Replicate implementation. A provider accepts a publicly reachable video
//! URL, runs an upscaling model against it, and exposes the finished
//! artifact for download.
//!
//! Provider failures are reported as values, not panics. The job
//! orchestration layer decides whether a failure is transient (poll again
//! later) or terminal (record it on the job).

pub mod catalog;
pub mod error;
pub mod provider;
pub mod replicate;

// Re-export commonly used types
pub use catalog::{find_model, EnhanceModel, DEFAULT_MODEL_KEY, MODELS};
pub use error::EnhanceError;
pub use provider::{EnhanceProvider, PollOutcome};
pub use replicate::ReplicateClient;
