//! Enhancement job orchestration.
//!
//! `create` persists a pending job and fires a detached submission task.
//! `refresh` is the poll-on-read path: reading a submitted or processing job
//! reconciles it against the provider, downloading and persisting the result
//! artifact when the provider reports success. Submission and refresh for the
//! same job are serialized through a per-job lock, and every status write goes
//! through the repository's guarded updates, so a terminal job can never be
//! resurrected.
//!
//! Provider failures are never surfaced as request errors. A failed submission
//! or a provider-reported failure lands in the job's `error_message` and the
//! job turns `failed`; a transient poll error is swallowed and the last known
//! status is returned.

use chrono::Utc;
use skyframe_core::models::{CreateJobRequest, Job, JobStatus, UploadStatus};
use skyframe_core::AppError;
use skyframe_db::{JobRepository, UploadRepository};
use skyframe_enhance::{find_model, EnhanceModel, EnhanceProvider, PollOutcome};
use skyframe_storage::{result_key, BlobStore};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::locks::JobLocks;

#[derive(Clone)]
pub struct JobService {
    jobs: JobRepository,
    uploads: UploadRepository,
    storage: Arc<dyn BlobStore>,
    provider: Arc<dyn EnhanceProvider>,
    locks: JobLocks,
    default_model: String,
}

impl JobService {
    pub fn new(
        jobs: JobRepository,
        uploads: UploadRepository,
        storage: Arc<dyn BlobStore>,
        provider: Arc<dyn EnhanceProvider>,
        default_model: String,
    ) -> Self {
        Self {
            jobs,
            uploads,
            storage,
            provider,
            locks: JobLocks::new(),
            default_model,
        }
    }

    /// Create a job against a completed upload and spawn the submission task.
    ///
    /// The job is returned immediately with status `pending`; the detached
    /// task moves it to `submitted` or `failed`.
    pub async fn create(&self, request: CreateJobRequest) -> Result<Job, AppError> {
        request.validate()?;

        let upload = self
            .uploads
            .get(request.upload_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Upload {} not found", request.upload_id))
            })?;

        if upload.status != UploadStatus::Complete {
            return Err(AppError::Validation(format!(
                "Upload {} is not complete (status: {})",
                upload.id,
                upload.status.as_str()
            )));
        }

        let model_key = request.model.as_deref().unwrap_or(&self.default_model);
        let model = find_model(model_key)
            .ok_or_else(|| AppError::Validation(format!("Unknown model '{}'", model_key)))?;

        if !self.provider.configured() {
            return Err(AppError::Validation(
                "Enhancement provider is not configured (REPLICATE_API_TOKEN not set)".to_string(),
            ));
        }

        let storage_key = upload.storage_key.as_deref().ok_or_else(|| {
            AppError::Internal(format!("Upload {} has no storage key", upload.id))
        })?;
        let source_url = self.storage.public_url(storage_key);

        let job = Job::pending(upload.id, model.key.to_string());
        self.jobs.create(&job).await?;

        tracing::info!(
            job_id = %job.id,
            upload_id = %upload.id,
            model = model.key,
            "Enhancement job created"
        );

        let service = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            service.run_submission(job_id, source_url, model).await;
        });

        Ok(job)
    }

    /// Detached submission task. Submits at most once: the `pending` guard on
    /// `mark_submitted` means a duplicated task finds nothing to do.
    async fn run_submission(&self, job_id: Uuid, source_url: String, model: &'static EnhanceModel) {
        let _guard = self.locks.acquire(job_id).await;

        let job = match self.jobs.get(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(job_id = %job_id, "Job vanished before submission");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to load job for submission");
                return;
            }
        };
        if job.status != JobStatus::Pending {
            return;
        }

        match self.provider.submit(&source_url, model).await {
            Ok(provider_id) => {
                match self.jobs.mark_submitted(job_id, &provider_id, Utc::now()).await {
                    Ok(true) => {
                        tracing::info!(job_id = %job_id, provider_id = %provider_id, "Job submitted");
                    }
                    Ok(false) => {
                        tracing::warn!(job_id = %job_id, "Job was no longer pending after submit");
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to record submission");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Submission failed");
                self.fail_job(job_id, &e.to_string()).await;
            }
        }
    }

    /// Return the job, reconciling `submitted`/`processing` jobs against the
    /// provider first. The poll has side effects: it can advance the job to
    /// `processing`, `completed` (downloading and storing the artifact), or
    /// `failed`. A poll error leaves the stored state untouched.
    pub async fn refresh(&self, id: Uuid) -> Result<Job, AppError> {
        let job = self.get(id).await?;
        if !needs_poll(job.status) {
            return Ok(job);
        }

        let _guard = self.locks.acquire(id).await;

        // Re-read under the lock; a concurrent refresh may have finished the job.
        let job = self.get(id).await?;
        if !needs_poll(job.status) {
            return Ok(job);
        }

        let Some(provider_id) = job.provider_id.clone() else {
            return Err(AppError::Internal(format!(
                "Job {} is {} but has no provider id",
                id,
                job.status.as_str()
            )));
        };

        let outcome = match self.provider.poll(&provider_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Status poll failed, returning last known status");
                return Ok(job);
            }
        };

        match outcome {
            PollOutcome::Running { progress } => {
                self.jobs.mark_processing(id, progress, Utc::now()).await?;
            }
            PollOutcome::Failed { error } => {
                tracing::info!(job_id = %id, error = %error, "Provider reported job failed");
                self.jobs.mark_failed(id, &error, Utc::now()).await?;
                self.locks.discard(id).await;
            }
            PollOutcome::Succeeded { result_url } => {
                self.ingest_result(&job, &result_url).await?;
                self.locks.discard(id).await;
            }
        }

        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Job, AppError> {
        self.jobs
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
    }

    pub async fn list_for_upload(&self, upload_id: Uuid) -> Result<Vec<Job>, AppError> {
        self.jobs.list_for_upload(upload_id).await
    }

    /// Pull the finished artifact from the provider and persist it. Any
    /// failure here is terminal: the provider-side result may be ephemeral,
    /// so there is no retry path.
    async fn ingest_result(&self, job: &Job, result_url: &str) -> Result<(), AppError> {
        let data = match self.provider.fetch_result(result_url).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Result fetch failed");
                self.fail_job(job.id, &format!("Result fetch failed: {}", e)).await;
                return Ok(());
            }
        };

        let filename = match self.uploads.get(job.upload_id).await? {
            Some(upload) => upload.filename,
            None => "video.mp4".to_string(),
        };
        let key = result_key(job.id, &filename, job.created_at);

        match self.storage.put(&key, data).await {
            Ok(size) => {
                self.jobs
                    .mark_completed(job.id, &key, size as i64, Utc::now())
                    .await?;
                tracing::info!(job_id = %job.id, result_key = %key, result_size = size, "Job completed");
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to store result");
                self.fail_job(job.id, &format!("Failed to store result: {}", e)).await;
            }
        }
        Ok(())
    }

    /// Best-effort terminal failure. The guarded update keeps an already
    /// terminal job untouched; a database error here is logged, not returned,
    /// because callers are already on an error path.
    async fn fail_job(&self, job_id: Uuid, error_message: &str) {
        match self.jobs.mark_failed(job_id, error_message, Utc::now()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(job_id = %job_id, "Job already terminal, failure not recorded");
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to mark job failed");
            }
        }
        self.locks.discard(job_id).await;
    }
}

fn needs_poll(status: JobStatus) -> bool {
    matches!(status, JobStatus::Submitted | JobStatus::Processing)
}
