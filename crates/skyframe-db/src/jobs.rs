use chrono::{DateTime, Utc};
use skyframe_core::models::{Job, JobStatus};
use skyframe_core::AppError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Repository for enhancement job records
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

fn job_from_row(row: &SqliteRow) -> Result<Job, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<JobStatus>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Job {
        id: row.try_get("id")?,
        upload_id: row.try_get("upload_id")?,
        model_key: row.try_get("model_key")?,
        status,
        provider_id: row.try_get("provider_id")?,
        progress: row.try_get("progress")?,
        result_key: row.try_get("result_key")?,
        result_size: row.try_get("result_size")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a freshly created pending job
    pub async fn create(&self, job: &Job) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, upload_id, model_key, status, provider_id, progress,
                result_key, result_size, error_message, created_at, updated_at, completed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id)
        .bind(job.upload_id)
        .bind(&job.model_key)
        .bind(job.status.as_str())
        .bind(&job.provider_id)
        .bind(job.progress)
        .bind(&job.result_key)
        .bind(job.result_size)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a job by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, upload_id, model_key, status, provider_id, progress,
                   result_key, result_size, error_message, created_at, updated_at, completed_at
            FROM jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(job_from_row).transpose()?)
    }

    /// List all jobs for an upload, newest first
    pub async fn list_for_upload(&self, upload_id: Uuid) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, upload_id, model_key, status, provider_id, progress,
                   result_key, result_size, error_message, created_at, updated_at, completed_at
            FROM jobs
            WHERE upload_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(upload_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(job_from_row).collect::<Result<_, _>>()?)
    }

    /// Record acceptance by the provider.
    ///
    /// Only a pending job can move to submitted, so the detached submission
    /// task is at-most-once even when spawned twice.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "mark_submitted", db.record_id = %id))]
    pub async fn mark_submitted(
        &self,
        id: Uuid,
        provider_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'submitted', provider_id = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(provider_id)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a provider-side progress observation.
    ///
    /// A null progress keeps whatever was last stored.
    pub async fn mark_processing(
        &self,
        id: Uuid,
        progress: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'processing', progress = COALESCE(?, progress), updated_at = ?
            WHERE id = ? AND status IN ('submitted', 'processing')
            "#,
        )
        .bind(progress)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finalize a job with its stored artifact.
    ///
    /// Returns false when a concurrent poll already finalized the row.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "mark_completed", db.record_id = %id))]
    pub async fn mark_completed(
        &self,
        id: Uuid,
        result_key: &str,
        result_size: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', result_key = ?, result_size = ?, progress = 100.0,
                error_message = NULL, completed_at = ?, updated_at = ?
            WHERE id = ? AND status IN ('submitted', 'processing')
            "#,
        )
        .bind(result_key)
        .bind(result_size)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a job failed with the reason. Terminal rows are left untouched.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "mark_failed", db.record_id = %id))]
    pub async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', error_message = ?, completed_at = ?, updated_at = ?
            WHERE id = ? AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(error_message)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
