use chrono::{DateTime, Utc};
use skyframe_core::models::{Upload, UploadStatus};
use skyframe_core::AppError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Repository for upload records
#[derive(Clone)]
pub struct UploadRepository {
    pool: SqlitePool,
}

fn upload_from_row(row: &SqliteRow) -> Result<Upload, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<UploadStatus>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Upload {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        content_type: row.try_get("content_type")?,
        size_bytes: row.try_get("size_bytes")?,
        status,
        storage_key: row.try_get("storage_key")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl UploadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a freshly reserved upload
    pub async fn create(&self, upload: &Upload) -> Result<(), AppError> {
        // Dynamic SQLx queries keep the build free of a DATABASE_URL requirement
        sqlx::query(
            r#"
            INSERT INTO uploads (
                id, filename, content_type, size_bytes, status,
                storage_key, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(upload.id)
        .bind(&upload.filename)
        .bind(&upload.content_type)
        .bind(upload.size_bytes)
        .bind(upload.status.as_str())
        .bind(&upload.storage_key)
        .bind(upload.created_at)
        .bind(upload.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an upload by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, content_type, size_bytes, status,
                   storage_key, created_at, updated_at
            FROM uploads
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(upload_from_row).transpose()?)
    }

    /// List uploads, newest first, optionally filtered by status
    pub async fn list(
        &self,
        status: Option<UploadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Upload>, AppError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT id, filename, content_type, size_bytes, status,
                           storage_key, created_at, updated_at
                    FROM uploads
                    WHERE status = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(status.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, filename, content_type, size_bytes, status,
                           storage_key, created_at, updated_at
                    FROM uploads
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(upload_from_row).collect::<Result<_, _>>()?)
    }

    /// Move a non-terminal upload into `uploading`.
    ///
    /// Returns false when the row is already terminal, in which case the
    /// caller must not touch the blob.
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "mark_uploading", db.record_id = %id))]
    pub async fn mark_uploading(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE uploads
            SET status = 'uploading', updated_at = ?
            WHERE id = ? AND status IN ('reserved', 'uploading')
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finalize an upload and record where its bytes live.
    ///
    /// Returns false when another caller finalized or failed the row first.
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "mark_complete", db.record_id = %id))]
    pub async fn mark_complete(
        &self,
        id: Uuid,
        storage_key: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE uploads
            SET status = 'complete', storage_key = ?, updated_at = ?
            WHERE id = ? AND status IN ('reserved', 'uploading')
            "#,
        )
        .bind(storage_key)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an upload failed. Terminal rows are left untouched.
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "mark_failed", db.record_id = %id))]
    pub async fn mark_failed(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE uploads
            SET status = 'failed', updated_at = ?
            WHERE id = ? AND status NOT IN ('complete', 'failed')
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
