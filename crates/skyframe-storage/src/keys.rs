//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{yyyy}/{mm}/{dd}/{upload_id}_{filename}` for source
//! videos, `outputs/{yyyy}/{mm}/{dd}/{job_id}_enhanced_{filename}` for
//! enhancement results. The date component comes from the owning record so a
//! key never moves once assigned.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

/// Reduce a client-supplied filename to characters that are safe in a
/// storage key. Anything outside `[A-Za-z0-9._-]` becomes an underscore.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate the storage key for an uploaded source video.
pub fn source_key(upload_id: Uuid, filename: &str, at: DateTime<Utc>) -> String {
    format!(
        "uploads/{:04}/{:02}/{:02}/{}_{}",
        at.year(),
        at.month(),
        at.day(),
        upload_id,
        sanitize_filename(filename)
    )
}

/// Generate the storage key for an enhancement result.
///
/// The stored filename carries an `enhanced_` prefix so a directory listing
/// distinguishes outputs from their sources at a glance.
pub fn result_key(job_id: Uuid, filename: &str, at: DateTime<Utc>) -> String {
    format!(
        "outputs/{:04}/{:02}/{:02}/{}_enhanced_{}",
        at.year(),
        at.month(),
        at.day(),
        job_id,
        sanitize_filename(filename)
    )
}
