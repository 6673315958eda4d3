//! HTTP handlers, one module per resource.

pub mod jobs;
pub mod models;
pub mod uploads;
