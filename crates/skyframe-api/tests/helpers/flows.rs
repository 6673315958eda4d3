//! Reusable request flows shared across test files.

use super::{api_path, TestApp};
use bytes::Bytes;
use serde_json::{json, Value};
use skyframe_core::Job;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_VIDEO: &[u8] = b"not really mp4 but good enough for tests";

/// Reserve, write, and complete an upload; returns its id.
pub async fn create_completed_upload(app: &TestApp) -> Uuid {
    create_completed_upload_with(app, TEST_VIDEO, "clip.mp4").await
}

pub async fn create_completed_upload_with(app: &TestApp, data: &[u8], filename: &str) -> Uuid {
    let response = app
        .server
        .post(&api_path("/uploads/init"))
        .json(&json!({
            "filename": filename,
            "size_bytes": data.len(),
            "content_type": "video/mp4",
        }))
        .await;
    assert_eq!(response.status_code(), 201, "init: {}", response.text());
    let body: Value = response.json();
    let id = Uuid::parse_str(body["id"].as_str().expect("id in response")).expect("valid uuid");

    let response = app
        .server
        .put(&api_path(&format!("/uploads/{}/file", id)))
        .content_type("application/octet-stream")
        .bytes(Bytes::copy_from_slice(data))
        .await;
    assert_eq!(response.status_code(), 204, "write: {}", response.text());

    let response = app
        .server
        .post(&api_path(&format!("/uploads/{}/complete", id)))
        .await;
    assert_eq!(response.status_code(), 200, "complete: {}", response.text());
    id
}

/// Create an enhancement job for the upload with the default model.
pub async fn create_job(app: &TestApp, upload_id: Uuid) -> Value {
    let response = app
        .server
        .post(&api_path("/jobs/create"))
        .json(&json!({ "upload_id": upload_id }))
        .await;
    assert_eq!(response.status_code(), 201, "create job: {}", response.text());
    response.json()
}

/// Poll the database until the job reaches `status`.
///
/// Panics if the job lands in a different terminal state or the wait times
/// out, so a stuck background submission fails the test instead of hanging it.
pub async fn wait_for_job_status(app: &TestApp, job_id: Uuid, status: &str) -> Job {
    let repository = app.job_repository();
    for _ in 0..200 {
        if let Some(job) = repository.get(job_id).await.expect("job query") {
            if job.status.as_str() == status {
                return job;
            }
            if job.status.is_terminal() {
                panic!(
                    "job {} reached terminal status {} while waiting for {}",
                    job_id,
                    job.status.as_str(),
                    status
                );
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for job {} to reach {}", job_id, status);
}
