//! X-ray attachments — storage key issuance and path bookkeeping.
//!
//! DESIGN
//! ======
//! Image blobs live in hosted object storage; rows only carry storage object
//! paths. This module validates an upload before a key is issued
//! (`{patient_id}/{uuid}.{ext}`) and maintains the path arrays on patient and
//! visit rows. Blob transfer itself happens directly between the office UI
//! and the storage service.

use sqlx::PgPool;
use uuid::Uuid;

/// Accepted image extensions, lowercased.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Upload size cap, matching the storage bucket policy.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum XrayError {
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn extension(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit_once('.')?.1;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check an upload's name and size before issuing a storage key.
///
/// # Errors
///
/// Validation error for a missing/unknown extension or an oversized file.
pub fn validate_upload(file_name: &str, size_bytes: u64) -> Result<(), XrayError> {
    let Some(ext) = extension(file_name) else {
        return Err(XrayError::Validation("file has no extension".into()));
    };
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(XrayError::Validation(format!("unsupported image type: .{ext}")));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(XrayError::Validation("image exceeds the 10 MB limit".into()));
    }
    Ok(())
}

/// Issue a storage object key for a validated upload.
///
/// # Errors
///
/// Same validation as [`validate_upload`].
pub fn object_key(patient_id: Uuid, file_name: &str) -> Result<String, XrayError> {
    validate_upload(file_name, 0)?;
    let Some(ext) = extension(file_name) else {
        return Err(XrayError::Validation("file has no extension".into()));
    };
    Ok(format!("{patient_id}/{}.{ext}", Uuid::new_v4()))
}

// =============================================================================
// PATH BOOKKEEPING
// =============================================================================

/// Attach a storage path to a patient's X-ray list. Already-attached paths
/// are left alone.
pub async fn attach_to_patient(pool: &PgPool, patient_id: Uuid, path: &str) -> Result<(), XrayError> {
    sqlx::query(
        r"UPDATE patients
          SET xray_images = array_append(coalesce(xray_images, '{}'), $2), updated_at = now()
          WHERE id = $1 AND NOT ($2 = ANY(coalesce(xray_images, '{}')))",
    )
    .bind(patient_id)
    .bind(path)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a storage path from a patient's X-ray list. Removing a path that is
/// not attached is a no-op.
pub async fn detach_from_patient(pool: &PgPool, patient_id: Uuid, path: &str) -> Result<(), XrayError> {
    sqlx::query(
        r"UPDATE patients
          SET xray_images = array_remove(coalesce(xray_images, '{}'), $2), updated_at = now()
          WHERE id = $1",
    )
    .bind(patient_id)
    .bind(path)
    .execute(pool)
    .await?;
    Ok(())
}

/// Attach a storage path to a visit's X-ray list.
pub async fn attach_to_visit(pool: &PgPool, visit_id: Uuid, path: &str) -> Result<(), XrayError> {
    sqlx::query(
        r"UPDATE visits
          SET xray_images = array_append(coalesce(xray_images, '{}'), $2), updated_at = now()
          WHERE id = $1 AND NOT ($2 = ANY(coalesce(xray_images, '{}')))",
    )
    .bind(visit_id)
    .bind(path)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a storage path from a visit's X-ray list.
pub async fn detach_from_visit(pool: &PgPool, visit_id: Uuid, path: &str) -> Result<(), XrayError> {
    sqlx::query(
        r"UPDATE visits
          SET xray_images = array_remove(coalesce(xray_images, '{}'), $2), updated_at = now()
          WHERE id = $1",
    )
    .bind(visit_id)
    .bind(path)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "xrays_test.rs"]
mod tests;
