//! Domain services: upload lifecycle and enhancement job orchestration.

pub mod jobs;
pub mod locks;
pub mod uploads;

pub use jobs::JobService;
pub use uploads::UploadService;
