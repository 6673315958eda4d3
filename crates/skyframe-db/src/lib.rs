//! Database repositories for the data access layer
//!
//! Each repository owns one table and provides CRUD plus the guarded status
//! transitions the upload and job state machines rely on. Guards live in the
//! SQL itself (`WHERE status IN (...)`) so concurrent writers can never
//! resurrect a terminal row; callers inspect the returned bool to learn
//! whether their transition won.

pub mod jobs;
pub mod uploads;

pub use jobs::JobRepository;
pub use uploads::UploadRepository;
